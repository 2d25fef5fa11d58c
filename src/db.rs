//! Database schema and operations
//!
//! The database holds the extracted catalog only. Production chains are
//! computed on demand and never stored.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

use crate::catalog::Catalog;
use crate::models::{Ingredient, Item, Machine, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_event INTEGER NOT NULL DEFAULT 0
        );

        -- seq keeps extraction order, which is the order recipes are offered in
        CREATE TABLE IF NOT EXISTS recipes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            duration_s REAL NOT NULL,
            is_event INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE TABLE IF NOT EXISTS recipe_products (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE TABLE IF NOT EXISTS recipe_machines (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            machine_id TEXT NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_products_item ON recipe_products(item_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_item ON recipe_ingredients(item_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, description, is_event) VALUES (?1, ?2, ?3, ?4)",
        params![item.id, item.name, item.description, item.is_event],
    )?;
    Ok(())
}

/// Insert or update a recipe together with its ingredient, product and machine lists
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT INTO recipes (id, name, duration_s, is_event) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             duration_s = excluded.duration_s,
             is_event = excluded.is_event",
        params![recipe.id, recipe.name, recipe.duration_s, recipe.is_event],
    )?;

    for table in ["recipe_ingredients", "recipe_products", "recipe_machines"] {
        conn.execute(&format!("DELETE FROM {table} WHERE recipe_id = ?1"), [&recipe.id])?;
    }

    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, position, item_id, amount) VALUES (?1, ?2, ?3, ?4)",
            params![recipe.id, position as i64, ingredient.item_id, ingredient.amount],
        )?;
    }
    for (position, product) in recipe.products.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_products (recipe_id, position, item_id, amount) VALUES (?1, ?2, ?3, ?4)",
            params![recipe.id, position as i64, product.item_id, product.amount],
        )?;
    }
    for (position, machine) in recipe.machines.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_machines (recipe_id, position, machine_id) VALUES (?1, ?2, ?3)",
            params![recipe.id, position as i64, machine.id],
        )?;
    }
    Ok(())
}

/// Store items and recipes in a single transaction
pub fn save_catalog(conn: &Connection, items: &[Item], recipes: &[Recipe]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for item in items {
        upsert_item(&tx, item)?;
    }
    for recipe in recipes {
        upsert_recipe(&tx, recipe)?;
    }
    tx.commit()?;
    info!(items = items.len(), recipes = recipes.len(), "saved catalog");
    Ok(())
}

/// Clear all extracted data (for re-extraction)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_machines;
        DELETE FROM recipe_products;
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// Number of stored items and recipes
pub fn count_records(conn: &Connection) -> Result<(usize, usize)> {
    let items: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    let recipes: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
    Ok((items as usize, recipes as usize))
}

fn load_entries(conn: &Connection, table: &str) -> Result<HashMap<String, Vec<Ingredient>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT recipe_id, item_id, amount FROM {table} ORDER BY recipe_id, position"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            Ingredient::new(row.get::<_, String>(1)?, row.get(2)?),
        ))
    })?;

    let mut entries: HashMap<String, Vec<Ingredient>> = HashMap::new();
    for row in rows {
        let (recipe_id, ingredient) = row?;
        entries.entry(recipe_id).or_default().push(ingredient);
    }
    Ok(entries)
}

fn load_machines(conn: &Connection) -> Result<HashMap<String, Vec<Machine>>> {
    let mut stmt =
        conn.prepare("SELECT recipe_id, machine_id FROM recipe_machines ORDER BY recipe_id, position")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut machines: HashMap<String, Vec<Machine>> = HashMap::new();
    for row in rows {
        let (recipe_id, machine_id) = row?;
        machines
            .entry(recipe_id)
            .or_default()
            .push(Machine::from_id(machine_id));
    }
    Ok(machines)
}

/// Load and validate the whole catalog
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let mut stmt = conn.prepare("SELECT id, name, description, is_event FROM items")?;
    let items = stmt
        .query_map([], |row| {
            Ok(Item {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                is_event: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut ingredients = load_entries(conn, "recipe_ingredients")?;
    let mut products = load_entries(conn, "recipe_products")?;
    let mut machines = load_machines(conn)?;

    let mut stmt = conn.prepare("SELECT id, name, duration_s, is_event FROM recipes ORDER BY seq")?;
    let recipes = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?
        .map(|row| {
            row.map(|(id, name, duration_s, is_event)| Recipe {
                ingredients: ingredients.remove(&id).unwrap_or_default(),
                products: products.remove(&id).unwrap_or_default(),
                machines: machines.remove(&id).unwrap_or_default(),
                id,
                name,
                duration_s,
                is_event,
            })
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let catalog = Catalog::new(items, recipes).context("Stored catalog failed validation")?;
    info!(
        items = catalog.items().len(),
        recipes = catalog.recipes().len(),
        "loaded catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn catalog_survives_storage() {
        let conn = memory_db();
        let (items, recipes) = sample::sample_records();
        save_catalog(&conn, &items, &recipes).unwrap();

        let catalog = load_catalog(&conn).unwrap();
        assert_eq!(catalog.items().len(), items.len());
        assert_eq!(catalog.recipes(), recipes.as_slice());
    }

    #[test]
    fn upsert_replaces_lists_and_keeps_order() {
        let conn = memory_db();
        let (items, mut recipes) = sample::sample_records();
        save_catalog(&conn, &items, &recipes).unwrap();

        recipes[0].ingredients = vec![Ingredient::new("Desc_OreCopper_C", 7.0)];
        upsert_recipe(&conn, &recipes[0]).unwrap();

        let catalog = load_catalog(&conn).unwrap();
        assert_eq!(catalog.recipes()[0].id, recipes[0].id);
        assert_eq!(
            catalog.recipes()[0].ingredients,
            vec![Ingredient::new("Desc_OreCopper_C", 7.0)]
        );
    }

    #[test]
    fn clear_empties_catalog() {
        let conn = memory_db();
        let (items, recipes) = sample::sample_records();
        save_catalog(&conn, &items, &recipes).unwrap();
        assert_eq!(count_records(&conn).unwrap(), (items.len(), recipes.len()));

        clear_catalog(&conn).unwrap();
        assert_eq!(count_records(&conn).unwrap(), (0, 0));
    }
}
