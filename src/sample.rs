//! Small built-in catalog for trying the calculator without game files

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::models::{Ingredient, Item, Machine, Recipe};

const SMELTER: &str = "Build_SmelterMk1_C";
const FOUNDRY: &str = "Build_FoundryMk1_C";
const CONSTRUCTOR: &str = "Build_ConstructorMk1_C";
const ASSEMBLER: &str = "Build_AssemblerMk1_C";
const REFINERY: &str = "Build_OilRefinery_C";

fn item(id: &str, name: &str, description: &str, is_event: bool) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        is_event,
    }
}

fn recipe(
    id: &str,
    name: &str,
    ingredients: &[(&str, f64)],
    products: &[(&str, f64)],
    machine: &str,
    duration_s: f64,
) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        ingredients: ingredients.iter().map(|&(i, a)| Ingredient::new(i, a)).collect(),
        products: products.iter().map(|&(i, a)| Ingredient::new(i, a)).collect(),
        machines: vec![Machine::from_id(machine)],
        duration_s,
        is_event: false,
    }
}

/// Items and recipes of the sample catalog, in extraction order
pub fn sample_records() -> (Vec<Item>, Vec<Recipe>) {
    let items = vec![
        item("Desc_OreIron_C", "Iron Ore", "Used for crafting.", false),
        item("Desc_OreCopper_C", "Copper Ore", "Used for crafting.", false),
        item("Desc_Coal_C", "Coal", "Mainly used as fuel.", false),
        item("Desc_Stone_C", "Limestone", "Used for crafting.", false),
        item("Desc_LiquidOil_C", "Crude Oil", "Refined into fuel and plastics.", false),
        item("Desc_HeavyOilResidue_C", "Heavy Oil Residue", "Refinery by-product.", false),
        item("Desc_IronIngot_C", "Iron Ingot", "Used for crafting.", false),
        item("Desc_CopperIngot_C", "Copper Ingot", "Used for crafting.", false),
        item("Desc_SteelIngot_C", "Steel Ingot", "Steel ingots.", false),
        item("Desc_IronPlate_C", "Iron Plate", "Used for crafting.", false),
        item("Desc_IronRod_C", "Iron Rod", "Used for crafting.", false),
        item("Desc_IronScrew_C", "Screw", "Lots of screws.", false),
        item("Desc_IronPlateReinforced_C", "Reinforced Iron Plate", "Used for crafting.", false),
        item("Desc_Wire_C", "Wire", "Used for crafting.", false),
        item("Desc_Cable_C", "Cable", "Used for crafting.", false),
        item("Desc_Cement_C", "Concrete", "Used for building.", false),
        item("Desc_Plastic_C", "Plastic", "A versatile material.", false),
        item("Desc_Gift_C", "FICSMAS Gift", "Found under FICSMAS trees.", true),
        item("Desc_CandyCane_C", "Candy Cane", "A seasonal treat.", true),
    ];

    let mut candy_cane = recipe(
        "Recipe_CandyCane_C",
        "Candy Cane",
        &[("Desc_Gift_C", 3.0)],
        &[("Desc_CandyCane_C", 1.0)],
        CONSTRUCTOR,
        12.0,
    );
    candy_cane.is_event = true;

    let recipes = vec![
        recipe(
            "Recipe_IngotIron_C",
            "Iron Ingot",
            &[("Desc_OreIron_C", 1.0)],
            &[("Desc_IronIngot_C", 1.0)],
            SMELTER,
            2.0,
        ),
        recipe(
            "Recipe_IngotCopper_C",
            "Copper Ingot",
            &[("Desc_OreCopper_C", 1.0)],
            &[("Desc_CopperIngot_C", 1.0)],
            SMELTER,
            2.0,
        ),
        recipe(
            "Recipe_IngotSteel_C",
            "Steel Ingot",
            &[("Desc_OreIron_C", 3.0), ("Desc_Coal_C", 3.0)],
            &[("Desc_SteelIngot_C", 3.0)],
            FOUNDRY,
            4.0,
        ),
        recipe(
            "Recipe_IronPlate_C",
            "Iron Plate",
            &[("Desc_IronIngot_C", 3.0)],
            &[("Desc_IronPlate_C", 2.0)],
            CONSTRUCTOR,
            6.0,
        ),
        recipe(
            "Recipe_IronRod_C",
            "Iron Rod",
            &[("Desc_IronIngot_C", 1.0)],
            &[("Desc_IronRod_C", 1.0)],
            CONSTRUCTOR,
            4.0,
        ),
        recipe(
            "Recipe_Alternate_Screw_C",
            "Alternate: Cast Screw",
            &[("Desc_IronIngot_C", 5.0)],
            &[("Desc_IronScrew_C", 20.0)],
            CONSTRUCTOR,
            24.0,
        ),
        recipe(
            "Recipe_Screw_C",
            "Screw",
            &[("Desc_IronRod_C", 1.0)],
            &[("Desc_IronScrew_C", 4.0)],
            CONSTRUCTOR,
            6.0,
        ),
        recipe(
            "Recipe_IronPlateReinforced_C",
            "Reinforced Iron Plate",
            &[("Desc_IronPlate_C", 6.0), ("Desc_IronScrew_C", 12.0)],
            &[("Desc_IronPlateReinforced_C", 1.0)],
            ASSEMBLER,
            12.0,
        ),
        recipe(
            "Recipe_Wire_C",
            "Wire",
            &[("Desc_CopperIngot_C", 1.0)],
            &[("Desc_Wire_C", 2.0)],
            CONSTRUCTOR,
            4.0,
        ),
        recipe(
            "Recipe_Cable_C",
            "Cable",
            &[("Desc_Wire_C", 2.0)],
            &[("Desc_Cable_C", 1.0)],
            CONSTRUCTOR,
            2.0,
        ),
        recipe(
            "Recipe_Concrete_C",
            "Concrete",
            &[("Desc_Stone_C", 3.0)],
            &[("Desc_Cement_C", 1.0)],
            CONSTRUCTOR,
            4.0,
        ),
        recipe(
            "Recipe_Plastic_C",
            "Plastic",
            &[("Desc_LiquidOil_C", 3.0)],
            &[("Desc_Plastic_C", 2.0), ("Desc_HeavyOilResidue_C", 1.0)],
            REFINERY,
            6.0,
        ),
        candy_cane,
    ];

    (items, recipes)
}

/// The sample catalog, validated
pub fn sample_catalog() -> Result<Catalog, CatalogError> {
    let (items, recipes) = sample_records();
    Catalog::new(items, recipes)
}
