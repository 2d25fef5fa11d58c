//! Validated, read-only set of items and recipes
//!
//! Everything the resolver reads comes through [`Catalog`]. Construction
//! rejects recipes the rate arithmetic cannot handle, so the resolver never
//! has to.

use std::collections::{HashMap, HashSet};

use crate::error::CatalogError;
use crate::models::{Item, Recipe};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    item_index: HashMap<String, usize>,
    recipes: Vec<Recipe>,
}

impl Catalog {
    /// Build a catalog, validating every recipe.
    ///
    /// Items are kept sorted by display name; recipes keep the given order,
    /// which is the order candidates are offered in.
    pub fn new(mut items: Vec<Item>, recipes: Vec<Recipe>) -> Result<Self, CatalogError> {
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let mut item_index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if item.id.is_empty() {
                return Err(CatalogError::MissingId);
            }
            if item_index.insert(item.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "item",
                    id: item.id.clone(),
                });
            }
        }

        let mut recipe_ids = HashSet::with_capacity(recipes.len());
        for recipe in &recipes {
            validate_recipe(recipe)?;
            if !recipe_ids.insert(recipe.id.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "recipe",
                    id: recipe.id.clone(),
                });
            }
        }

        Ok(Catalog {
            items,
            item_index,
            recipes,
        })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.item_index.get(id).map(|&i| &self.items[i])
    }

    /// Find an item by id, or by display name ignoring case.
    pub fn lookup(&self, query: &str) -> Option<&Item> {
        let query = query.trim();
        self.item(query).or_else(|| {
            self.items
                .iter()
                .find(|item| item.name.eq_ignore_ascii_case(query))
        })
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Display name for an item id, falling back to the id itself.
    pub fn item_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.item(id).map_or(id, |item| item.name.as_str())
    }

    /// Recipes listing `item_id` among their products, in catalog order.
    pub fn recipes_producing<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes.iter().filter(move |r| r.has_product(item_id))
    }
}

/// Check that a recipe is usable by the resolver.
pub fn validate_recipe(recipe: &Recipe) -> Result<(), CatalogError> {
    if recipe.id.is_empty() {
        return Err(CatalogError::MissingId);
    }
    if !(recipe.duration_s.is_finite() && recipe.duration_s > 0.0) {
        return Err(CatalogError::InvalidDuration {
            recipe: recipe.id.clone(),
            value: recipe.duration_s.to_string(),
        });
    }
    if recipe.products.is_empty() {
        return Err(CatalogError::NoProducts {
            recipe: recipe.id.clone(),
        });
    }
    if recipe.machines.is_empty() {
        return Err(CatalogError::NoMachines {
            recipe: recipe.id.clone(),
        });
    }
    for entry in recipe.ingredients.iter().chain(&recipe.products) {
        if entry.item_id.is_empty() {
            return Err(CatalogError::MalformedIngredient {
                recipe: recipe.id.clone(),
                entry: format!("(amount {})", entry.amount),
            });
        }
        if !(entry.amount.is_finite() && entry.amount > 0.0) {
            return Err(CatalogError::NonPositiveAmount {
                recipe: recipe.id.clone(),
                item: entry.item_id.clone(),
                amount: entry.amount,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, Machine};

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            is_event: false,
        }
    }

    fn recipe(id: &str, duration_s: f64) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            ingredients: vec![Ingredient::new("Desc_OreIron_C", 1.0)],
            products: vec![Ingredient::new("Desc_IronIngot_C", 1.0)],
            machines: vec![Machine::from_id("Build_SmelterMk1_C")],
            duration_s,
            is_event: false,
        }
    }

    #[test]
    fn items_sorted_by_name() {
        let catalog = Catalog::new(
            vec![item("Desc_B_C", "Zinc"), item("Desc_A_C", "Alloy")],
            vec![],
        )
        .unwrap();
        let names: Vec<_> = catalog.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Alloy", "Zinc"]);
        assert_eq!(catalog.item_name("Desc_B_C"), "Zinc");
        assert_eq!(catalog.item_name("Desc_Missing_C"), "Desc_Missing_C");
        assert_eq!(catalog.lookup("zinc").map(|i| i.id.as_str()), Some("Desc_B_C"));
        assert_eq!(catalog.lookup("Desc_A_C").map(|i| i.name.as_str()), Some("Alloy"));
        assert!(catalog.lookup("Iron").is_none());
    }

    #[test]
    fn rejects_non_positive_duration() {
        let err = Catalog::new(vec![], vec![recipe("Recipe_Bad_C", 0.0)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDuration { .. }));
    }

    #[test]
    fn rejects_recipe_without_machines_or_products() {
        let mut no_machines = recipe("Recipe_A_C", 2.0);
        no_machines.machines.clear();
        assert_eq!(
            validate_recipe(&no_machines),
            Err(CatalogError::NoMachines {
                recipe: "Recipe_A_C".to_string()
            })
        );

        let mut no_products = recipe("Recipe_B_C", 2.0);
        no_products.products.clear();
        assert!(matches!(
            validate_recipe(&no_products),
            Err(CatalogError::NoProducts { .. })
        ));
    }

    #[test]
    fn rejects_degraded_ingredients() {
        let mut zero = recipe("Recipe_A_C", 2.0);
        zero.ingredients[0].amount = 0.0;
        assert!(matches!(
            validate_recipe(&zero),
            Err(CatalogError::NonPositiveAmount { .. })
        ));

        let mut empty = recipe("Recipe_B_C", 2.0);
        empty.products[0].item_id.clear();
        assert!(matches!(
            validate_recipe(&empty),
            Err(CatalogError::MalformedIngredient { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_recipes() {
        let err = Catalog::new(
            vec![],
            vec![recipe("Recipe_A_C", 2.0), recipe("Recipe_A_C", 3.0)],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { kind: "recipe", .. }));
    }
}
