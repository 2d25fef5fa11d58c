//! Satisfactory Production Calculator
//!
//! A production chain calculator for Satisfactory.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use satisfactory_calculator::calculator::{
    format_production_chain, summarize_chain, ResolveOptions, Resolver,
};
use satisfactory_calculator::catalog::Catalog;
use satisfactory_calculator::models::{is_raw_resource, NodePath};
use satisfactory_calculator::rates::{base_rate, round_to};
use satisfactory_calculator::report::imbalances;
use satisfactory_calculator::selector::{default_choice, select_candidates};
use satisfactory_calculator::{db, extract, sample};

#[derive(Parser)]
#[command(name = "satisfactory-calculator")]
#[command(version, about = "Production chain calculator for Satisfactory")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "satisfactory.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract items and recipes from the game's docs JSON
    Extract {
        /// Directory containing Docs.json or items.json / recipes.json
        source_dir: PathBuf,

        /// Clear existing data before extraction
        #[arg(long)]
        clear: bool,

        /// Abort on the first malformed record instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Calculate the production chain for a target item
    Calc {
        /// Target item id or display name (e.g. "Reinforced Iron Plate")
        item: String,

        /// Target rate in items per minute (defaults to one machine's output)
        #[arg(short, long)]
        rate: Option<f64>,

        /// Offer recipes from limited-time events
        #[arg(short = 'e', long)]
        include_events: bool,

        /// Use RECIPE whenever ITEM is needed, as ITEM=RECIPE
        #[arg(long = "recipe", value_parser = parse_key_value)]
        recipes: Vec<(String, String)>,

        /// Override a node's output, as PATH=RATE (PATH is `root` or e.g. `0.1`)
        #[arg(long = "set-rate", value_parser = parse_key_value)]
        set_rates: Vec<(String, String)>,

        /// Round the machine count of the node at PATH up to a whole number
        #[arg(long = "round-up")]
        round_up: Vec<NodePath>,

        /// Round every machine count up
        #[arg(long)]
        round_up_all: bool,

        /// Show detailed production tree
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all items in the database
    ListItems {
        /// Include items from limited-time events
        #[arg(short = 'e', long)]
        include_events: bool,
    },

    /// List the recipes that produce an item
    Recipes {
        /// Item id or display name
        item: String,

        /// Include recipes from limited-time events
        #[arg(short = 'e', long)]
        include_events: bool,
    },

    /// Show details for a specific item
    Item {
        /// Item id or display name
        id: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without game files)
    LoadSample,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("satisfactory_calculator=info")),
        )
        .init();

    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Extract {
            source_dir,
            clear,
            strict,
        } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::extract_to_database(&conn, &source_dir, strict)?;
            println!("\n{}", stats);
        }

        Commands::Calc {
            item,
            rate,
            include_events,
            recipes,
            set_rates,
            round_up,
            round_up_all,
            verbose,
        } => {
            let catalog = load_catalog(&conn)?;
            let item_id = resolve_item_id(&catalog, &item)?;

            let mut options = ResolveOptions::with_events(include_events);
            for (item, recipe) in recipes {
                let id = resolve_item_id(&catalog, &item)?;
                options.recipe_choices.insert(id, recipe);
            }
            let resolver = Resolver::new(&catalog, &options);

            let rate = rate
                .or_else(|| resolver.one_machine_rate(&item_id))
                .unwrap_or(1.0);
            let mut chain = resolver.resolve(&item_id, rate)?;

            for (raw_path, value) in &set_rates {
                let path: NodePath = raw_path
                    .parse()
                    .map_err(|e| anyhow!("invalid node path '{raw_path}': {e}"))?;
                chain = resolver.update_at(&chain, &path, |resolver, node, _| {
                    resolver.edit_rate(node, value)
                })?;
            }
            for path in &round_up {
                chain = resolver.round_up_at(&chain, path)?;
            }
            if round_up_all {
                chain = resolver.round_up_all(&chain)?;
            }

            if chain.is_raw() {
                println!(
                    "{} is a raw resource: gather {}/m.",
                    chain.item_name,
                    round_to(chain.demand_rate, 4)
                );
                return Ok(());
            }
            if chain.is_unresolved() {
                println!(
                    "No available recipe produces {}.{}",
                    chain.item_name,
                    if include_events { "" } else { " Try --include-events." }
                );
                return Ok(());
            }

            if verbose {
                println!("Production chain:\n");
                println!("{}", format_production_chain(&chain, 0));

                let off = imbalances(&chain);
                if !off.is_empty() {
                    println!("Imbalances:");
                    for entry in off {
                        println!("  [{}] {}: {}", entry.path, entry.item_name, entry.balance);
                    }
                    println!();
                }
            }

            let summary = summarize_chain(&chain);
            println!("{}", summary);
        }

        Commands::ListItems { include_events } => {
            let catalog = load_catalog(&conn)?;
            let items: Vec<_> = catalog
                .items()
                .iter()
                .filter(|i| include_events || !i.is_event)
                .collect();
            if items.is_empty() {
                println!("No items in database. Run 'extract' or 'load-sample' first.");
            } else {
                println!("{:<32} {:<36} {:>8}", "Item", "ID", "Recipes");
                println!("{}", "-".repeat(78));
                for i in items {
                    let producers = if is_raw_resource(&i.id) {
                        "raw".to_string()
                    } else {
                        select_candidates(&catalog, &i.id, include_events)
                            .len()
                            .to_string()
                    };
                    println!("{:<32} {:<36} {:>8}", i.name, i.id, producers);
                }
            }
        }

        Commands::Recipes {
            item,
            include_events,
        } => {
            let catalog = load_catalog(&conn)?;
            let item_id = resolve_item_id(&catalog, &item)?;
            let candidates = select_candidates(&catalog, &item_id, include_events);
            if candidates.is_empty() {
                println!("No recipes produce {}", catalog.item_name(&item_id));
            } else {
                let default = default_choice(&candidates).map(|c| c.recipe_id.clone());
                println!("Recipes for {}:", catalog.item_name(&item_id));
                for c in &candidates {
                    let marker = if Some(&c.recipe_id) == default.as_ref() { "*" } else { " " };
                    let per_minute = catalog
                        .recipe(&c.recipe_id)
                        .map(|r| format!("{}/m", round_to(base_rate(r), 4)))
                        .unwrap_or_default();
                    println!("  {} {:<32} {:<36} {:>10}", marker, c.name, c.recipe_id, per_minute);
                }
            }
        }

        Commands::Item { id } => {
            let catalog = load_catalog(&conn)?;
            if let Some(i) = catalog.lookup(&id) {
                println!("Item: {}", i.name);
                println!("  ID: {}", i.id);
                if !i.description.is_empty() {
                    println!("  Description: {}", i.description);
                }
                if is_raw_resource(&i.id) {
                    println!("  Raw resource");
                }
                if i.is_event {
                    println!("  Event item");
                }

                let producers: Vec<_> = catalog.recipes_producing(&i.id).collect();
                if !producers.is_empty() {
                    println!("  Produced by:");
                    for r in producers {
                        println!(
                            "    {} in {} @ {}/m",
                            r.name,
                            r.machine_name(),
                            round_to(base_rate(r), 4)
                        );
                    }
                }

                let consumers: Vec<_> = catalog
                    .recipes()
                    .iter()
                    .filter(|r| r.ingredients.iter().any(|ing| ing.item_id == i.id))
                    .collect();
                if !consumers.is_empty() {
                    println!("  Used by:");
                    for r in consumers {
                        println!("    {}", r.name);
                    }
                }
            } else {
                println!("Item '{}' not found", id);
            }
        }

        Commands::Init => {
            let (items, recipes) = db::count_records(&conn)?;
            println!("Database initialized at: {}", cli.database.display());
            println!("  {} items, {} recipes", items, recipes);
        }

        Commands::LoadSample => {
            let (items, recipes) = sample::sample_records();
            db::clear_catalog(&conn)?;
            db::save_catalog(&conn, &items, &recipes)?;
            println!(
                "Loaded {} sample items and {} recipes",
                items.len(),
                recipes.len()
            );
        }
    }

    Ok(())
}

fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let catalog = db::load_catalog(conn)?;
    if catalog.items().is_empty() {
        bail!("No items in database. Run 'extract' or 'load-sample' first.");
    }
    Ok(catalog)
}

/// Item id for a user query; raw resource ids are accepted even without an item record.
fn resolve_item_id(catalog: &Catalog, query: &str) -> Result<String> {
    if let Some(item) = catalog.lookup(query) {
        return Ok(item.id.clone());
    }
    if is_raw_resource(query.trim()) {
        return Ok(query.trim().to_string());
    }
    bail!("Unknown item '{}'", query)
}
