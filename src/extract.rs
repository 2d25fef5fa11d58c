//! Game docs extraction for Satisfactory item and recipe data
//!
//! Reads the JSON docs exported by the game (either separate `items.json` /
//! `recipes.json` arrays or the combined `Docs.json` grouped by
//! `NativeClass`), decodes the encoded ingredient and producer strings, and
//! stores the validated records in the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::validate_recipe;
use crate::db;
use crate::error::CatalogError;
use crate::models::{Ingredient, Item, Machine, Recipe};

/// Item descriptor as it appears in the docs
#[derive(Debug, Deserialize)]
pub struct RawItem {
    #[serde(rename = "ClassName", default)]
    pub class_name: String,
    #[serde(rename = "mDisplayName", default)]
    pub display_name: String,
    #[serde(rename = "mDescription", default)]
    pub description: String,
    #[serde(rename = "mSmallIcon", default)]
    pub small_icon: String,
}

/// Recipe as it appears in the docs, list fields still encoded
#[derive(Debug, Deserialize)]
pub struct RawRecipe {
    #[serde(rename = "ClassName", default)]
    pub class_name: String,
    #[serde(rename = "FullName", default)]
    pub full_name: String,
    #[serde(rename = "mDisplayName", default)]
    pub display_name: String,
    #[serde(rename = "mIngredients", default)]
    pub ingredients: String,
    #[serde(rename = "mProduct", default)]
    pub products: String,
    #[serde(rename = "mProducedIn", default)]
    pub produced_in: String,
    // Usually a string like "4.000000", occasionally a bare number
    #[serde(rename = "mManufactoringDuration", default)]
    pub duration: Value,
    #[serde(rename = "mRelevantEvents", default)]
    pub relevant_events: String,
}

/// Records pulled out of one or more docs files
#[derive(Debug, Default)]
pub struct ExtractedDocs {
    pub items: Vec<Item>,
    pub recipes: Vec<Recipe>,
    pub rejected: Vec<CatalogError>,
    /// Recipes dropped on purpose: build gun, workbench-only, conversions
    pub skipped: usize,
}

/// Compiled patterns for the encoded list fields
pub struct DocsParser {
    entry_re: Regex,
    ingredient_re: Regex,
    producer_re: Regex,
    excluded_recipe_re: Regex,
}

impl DocsParser {
    pub fn new() -> Result<Self> {
        Ok(DocsParser {
            // (ItemClass=...,Amount=3)
            entry_re: Regex::new(r"\(ItemClass=[^)]*\)")?,
            // ...Desc_IronPlate.Desc_IronPlate_C"',Amount=3)
            ingredient_re: Regex::new(
                r#"^\(ItemClass=.*\.(?P<id>\w+_C)\W*,\s*Amount=(?P<amount>[^)]*)\)$"#,
            )?,
            producer_re: Regex::new(r#""([^"]+)""#)?,
            excluded_recipe_re: Regex::new(r"ResourceConversion|Unpackage")?,
        })
    }

    /// Decode an ingredient or product list.
    ///
    /// Every `(ItemClass=...)` entry must carry an item id and a positive
    /// amount, otherwise the whole recipe is rejected.
    pub fn parse_ingredients(&self, recipe_id: &str, encoded: &str) -> Result<Vec<Ingredient>, CatalogError> {
        let mut ingredients = Vec::new();
        for entry in self.entry_re.find_iter(encoded) {
            let entry = entry.as_str();
            let malformed = || CatalogError::MalformedIngredient {
                recipe: recipe_id.to_string(),
                entry: entry.to_string(),
            };
            let caps = self.ingredient_re.captures(entry).ok_or_else(malformed)?;
            let amount: f64 = caps["amount"].trim().parse().map_err(|_| malformed())?;
            if !(amount.is_finite() && amount > 0.0) {
                return Err(CatalogError::NonPositiveAmount {
                    recipe: recipe_id.to_string(),
                    item: caps["id"].to_string(),
                    amount,
                });
            }
            ingredients.push(Ingredient::new(&caps["id"], amount));
        }
        Ok(ingredients)
    }

    /// Decode the producer list into machines, leaving out crafting benches.
    pub fn parse_machines(&self, encoded: &str) -> Vec<Machine> {
        self.producer_re
            .captures_iter(encoded)
            .map(|cap| cap[1].to_string())
            .filter(|path| !path.contains("WorkBench"))
            .map(|path| Machine::from_id(class_id(&path)))
            .collect()
    }

    pub fn parse_item(&self, raw: RawItem) -> Result<Item, CatalogError> {
        if raw.class_name.is_empty() {
            return Err(CatalogError::MissingId);
        }
        Ok(Item {
            is_event: raw.small_icon.contains("/Events/"),
            id: raw.class_name,
            name: raw.display_name,
            description: raw.description,
        })
    }

    /// Convert a docs recipe into a catalog recipe.
    ///
    /// Returns `Ok(None)` for recipes that are not made in a machine: build
    /// gun and workbench-only recipes, resource conversions and unpackaging.
    pub fn parse_recipe(&self, raw: RawRecipe) -> Result<Option<Recipe>, CatalogError> {
        if raw.class_name.is_empty() {
            return Err(CatalogError::MissingId);
        }
        if raw.produced_in.trim().is_empty()
            || raw.produced_in.contains("BuildGun")
            || self.excluded_recipe_re.is_match(&raw.full_name)
        {
            return Ok(None);
        }
        let machines = self.parse_machines(&raw.produced_in);
        if machines.is_empty() {
            return Ok(None);
        }

        let duration_s = parse_duration(&raw.duration).ok_or_else(|| CatalogError::InvalidDuration {
            recipe: raw.class_name.clone(),
            value: raw.duration.to_string(),
        })?;

        let recipe = Recipe {
            ingredients: self.parse_ingredients(&raw.class_name, &raw.ingredients)?,
            products: self.parse_ingredients(&raw.class_name, &raw.products)?,
            machines,
            duration_s,
            is_event: !raw.relevant_events.trim().is_empty(),
            id: raw.class_name,
            name: raw.display_name,
        };
        validate_recipe(&recipe)?;
        Ok(Some(recipe))
    }

    /// Parse the text of one docs file into `docs`.
    ///
    /// Fails only when the text is not a JSON array; bad records are
    /// collected in `docs.rejected`.
    pub fn parse_docs(&self, text: &str, docs: &mut ExtractedDocs) -> Result<()> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Array(entries) = root else {
            bail!("expected a JSON array at the top level");
        };

        for mut entry in entries {
            let recipe_group = entry
                .get("NativeClass")
                .and_then(Value::as_str)
                .map(|native_class| native_class.contains("FGRecipe"));
            if let Some(is_recipe_group) = recipe_group {
                let classes = match entry.get_mut("Classes").map(Value::take) {
                    Some(Value::Array(classes)) => classes,
                    _ => continue,
                };
                for class in classes {
                    if is_recipe_group {
                        self.push_recipe(class, docs);
                    } else if class.get("mSmallIcon").is_some() {
                        self.push_item(class, docs);
                    }
                }
            } else if entry.get("mIngredients").is_some() {
                self.push_recipe(entry, docs);
            } else if entry.get("mSmallIcon").is_some() {
                self.push_item(entry, docs);
            }
        }
        Ok(())
    }

    fn push_item(&self, value: Value, docs: &mut ExtractedDocs) {
        let parsed = serde_json::from_value::<RawItem>(value)
            .map_err(|e| CatalogError::InvalidRecord {
                kind: "item",
                message: e.to_string(),
            })
            .and_then(|raw| self.parse_item(raw));
        match parsed {
            Ok(item) => docs.items.push(item),
            Err(e) => docs.rejected.push(e),
        }
    }

    fn push_recipe(&self, value: Value, docs: &mut ExtractedDocs) {
        let parsed = serde_json::from_value::<RawRecipe>(value)
            .map_err(|e| CatalogError::InvalidRecord {
                kind: "recipe",
                message: e.to_string(),
            })
            .and_then(|raw| self.parse_recipe(raw));
        match parsed {
            Ok(Some(recipe)) => docs.recipes.push(recipe),
            Ok(None) => docs.skipped += 1,
            Err(e) => docs.rejected.push(e),
        }
    }
}

/// Class id from a producer path, e.g. `Build_SmelterMk1_C` from
/// `/Game/.../Build_SmelterMk1.Build_SmelterMk1_C`.
fn class_id(path: &str) -> &str {
    let trimmed = path.trim_matches(|c: char| c == '\'' || c == '"');
    trimmed
        .rsplit('.')
        .next()
        .unwrap_or(trimmed)
        .trim_end_matches('\'')
}

fn parse_duration(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

/// Read a docs file, accepting UTF-8 (with or without BOM) and the UTF-16LE
/// the game writes `Docs.json` in.
pub fn read_docs_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units)
            .with_context(|| format!("Invalid UTF-16 in {}", path.display()));
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec()).with_context(|| format!("Invalid UTF-8 in {}", path.display()))
}

/// Find all JSON files below `source_dir`
pub fn find_docs_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        bail!("{} is not a directory", source_dir.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();
    files.sort();
    Ok(files)
}

/// Extract all item and recipe data below `source_dir` and populate the database.
///
/// Bad records are logged and counted; with `strict` the first one aborts
/// the extraction before anything is written.
pub fn extract_to_database(conn: &Connection, source_dir: &Path, strict: bool) -> Result<ExtractStats> {
    let parser = DocsParser::new()?;
    let mut stats = ExtractStats::default();
    let mut docs = ExtractedDocs::default();

    info!(dir = %source_dir.display(), "scanning for docs files");
    let files = find_docs_files(source_dir)?;
    info!(count = files.len(), "found docs files");

    for path in &files {
        let before = (docs.items.len(), docs.recipes.len());
        let parsed = read_docs_file(path).and_then(|text| parser.parse_docs(&text, &mut docs));
        match parsed {
            Ok(()) => {
                stats.files += 1;
                debug!(
                    file = %path.display(),
                    items = docs.items.len() - before.0,
                    recipes = docs.recipes.len() - before.1,
                    "parsed"
                );
            }
            Err(e) => {
                if strict {
                    return Err(e.context(format!("Failed to parse {}", path.display())));
                }
                warn!(file = %path.display(), error = %e, "skipping unreadable docs file");
                stats.errors += 1;
            }
        }
    }

    if let Some(first) = docs.rejected.first() {
        if strict {
            bail!("rejected record: {first}");
        }
        for err in &docs.rejected {
            warn!(error = %err, "rejected record");
        }
    }

    db::save_catalog(conn, &docs.items, &docs.recipes)?;

    stats.items = docs.items.len();
    stats.recipes = docs.recipes.len();
    stats.skipped = docs.skipped;
    stats.errors += docs.rejected.len();
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub files: usize,
    pub items: usize,
    pub recipes: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} items and {} recipes from {} files. Skipped: {}, Errors: {}",
            self.items, self.recipes, self.files, self.skipped, self.errors
        )
    }
}
