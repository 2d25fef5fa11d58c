//! End-to-end resolution scenarios against small catalogs and the sample data.

use rusqlite::Connection;
use satisfactory_calculator::calculator::{summarize_chain, ResolveOptions, Resolver};
use satisfactory_calculator::catalog::Catalog;
use satisfactory_calculator::models::{Ingredient, Item, Machine, NodePath, Recipe};
use satisfactory_calculator::report::{imbalances, node_balance, Balance};
use satisfactory_calculator::{db, sample};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn item(id: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        is_event: false,
    }
}

/// 3 iron ore -> 2 X every 4 seconds in a constructor.
fn x_recipe(is_event: bool) -> Recipe {
    Recipe {
        id: "Recipe_X_C".to_string(),
        name: "X".to_string(),
        ingredients: vec![Ingredient::new("Desc_OreIron_C", 3.0)],
        products: vec![Ingredient::new("Desc_X_C", 2.0)],
        machines: vec![Machine::from_id("Build_ConstructorMk1_C")],
        duration_s: 4.0,
        is_event,
    }
}

fn x_catalog(is_event: bool) -> Catalog {
    Catalog::new(
        vec![item("Desc_X_C", "X"), item("Desc_OreIron_C", "Iron Ore")],
        vec![x_recipe(is_event)],
    )
    .unwrap()
}

#[test]
fn exact_demand_resolves_to_whole_machines() {
    let catalog = x_catalog(false);
    let options = ResolveOptions::default();
    let tree = Resolver::new(&catalog, &options).resolve("Desc_X_C", 90.0).unwrap();

    assert_eq!(tree.multiplier, 3.0);
    assert_eq!(tree.machine_count, 3.0);
    assert_eq!(tree.output_rate, 90.0);
    assert_eq!(node_balance(&tree), Some(Balance::Balanced));

    assert_eq!(tree.children.len(), 1);
    let ore = &tree.children[0];
    assert!(ore.is_raw());
    assert_eq!(ore.item_name, "Iron Ore");
    assert_eq!(ore.demand_rate, 135.0);
    assert!(ore.children.is_empty());
}

#[test]
fn fractional_demand_rounds_up_on_request() {
    let catalog = x_catalog(false);
    let options = ResolveOptions::default();
    let resolver = Resolver::new(&catalog, &options);
    let tree = resolver.resolve("Desc_X_C", 100.0).unwrap();

    assert!(close(tree.machine_count, 10.0 / 3.0));
    assert!(!tree.rounded);
    assert!(imbalances(&tree).is_empty());

    let rounded = resolver.apply_round_up(&tree).unwrap();
    assert_eq!(rounded.machine_count, 4.0);
    assert!(rounded.rounded);
    assert_eq!(rounded.output_rate, 120.0);
    assert_eq!(rounded.demand_rate, 100.0);
    assert_eq!(rounded.children[0].demand_rate, 180.0);

    match node_balance(&rounded) {
        Some(Balance::Surplus(extra)) => assert!(close(extra, 20.0)),
        other => panic!("expected surplus, got {other:?}"),
    }

    let found = imbalances(&rounded);
    assert_eq!(found.len(), 1);
    assert!(found[0].path.is_root());
}

#[test]
fn lowering_rate_reports_deficit() {
    let catalog = x_catalog(false);
    let options = ResolveOptions::default();
    let resolver = Resolver::new(&catalog, &options);
    let tree = resolver.resolve("Desc_X_C", 90.0).unwrap();

    let edited = resolver.set_rate(&tree, 60.0).unwrap();
    assert_eq!(edited.machine_count, 2.0);
    assert_eq!(node_balance(&edited), Some(Balance::Deficit(30.0)));
}

#[test]
fn unknown_item_is_unresolved() {
    let catalog = x_catalog(false);
    let options = ResolveOptions::default();
    let tree = Resolver::new(&catalog, &options).resolve("Desc_Z_C", 10.0).unwrap();

    assert!(tree.is_unresolved());
    assert!(tree.children.is_empty());
    assert!(tree.candidates.is_empty());
    assert_eq!(tree.demand_rate, 10.0);
    assert_eq!(tree.item_name, "Desc_Z_C");
}

#[test]
fn event_recipe_needs_include_events() {
    let catalog = x_catalog(true);

    let hidden = ResolveOptions::default();
    let tree = Resolver::new(&catalog, &hidden).resolve("Desc_X_C", 90.0).unwrap();
    assert!(tree.is_unresolved());
    assert!(tree.children.is_empty());

    let shown = ResolveOptions::with_events(true);
    let tree = Resolver::new(&catalog, &shown).resolve("Desc_X_C", 90.0).unwrap();
    assert_eq!(tree.recipe().map(|r| r.id.as_str()), Some("Recipe_X_C"));
    assert_eq!(tree.machine_count, 3.0);
    assert_eq!(tree.children[0].demand_rate, 135.0);
}

#[test]
fn reinforced_plate_chain_from_sample_catalog() {
    let catalog = sample::sample_catalog().unwrap();
    let options = ResolveOptions::default();
    let resolver = Resolver::new(&catalog, &options);

    let rate = resolver.one_machine_rate("Desc_IronPlateReinforced_C").unwrap();
    assert!(close(rate, 5.0));

    let tree = resolver.resolve("Desc_IronPlateReinforced_C", rate).unwrap();
    assert!(close(tree.machine_count, 1.0));
    assert_eq!(tree.depth(), 4);

    let plates = &tree.children[0];
    assert_eq!(plates.item_id, "Desc_IronPlate_C");
    assert!(close(plates.demand_rate, 30.0));
    assert!(close(plates.machine_count, 1.5));

    let screws = &tree.children[1];
    assert_eq!(screws.item_id, "Desc_IronScrew_C");
    // The alternate is listed first but the standard recipe is the default.
    assert_eq!(screws.candidates.len(), 2);
    assert_eq!(screws.recipe().unwrap().id, "Recipe_Screw_C");
    assert!(close(screws.demand_rate, 60.0));

    let summary = summarize_chain(&tree);
    assert_eq!(summary.raw_inputs.len(), 1);
    assert_eq!(summary.raw_inputs[0].0, "Iron Ore");
    assert!(close(summary.raw_inputs[0].1, 60.0));
    assert!(summary.unresolved.is_empty());
    assert_eq!(summary.imbalanced_nodes, 0);
}

#[test]
fn switching_screws_to_alternate() {
    let catalog = sample::sample_catalog().unwrap();
    let options = ResolveOptions::default();
    let resolver = Resolver::new(&catalog, &options);
    let tree = resolver.resolve("Desc_IronPlateReinforced_C", 5.0).unwrap();

    let path: NodePath = "1".parse().unwrap();
    let switched = resolver
        .choose_recipe_at(&tree, &path, "Recipe_Alternate_Screw_C")
        .unwrap();
    let screws = &switched.children[1];
    assert_eq!(screws.recipe().unwrap().id, "Recipe_Alternate_Screw_C");
    assert!(close(screws.output_rate, 60.0));
    // 20 screws per 24 s is 50/m, 5 ingots per 24 s is 12.5/m.
    assert!(close(screws.multiplier, 1.2));
    assert_eq!(screws.children[0].item_id, "Desc_IronIngot_C");
    assert!(close(screws.children[0].demand_rate, 15.0));

    // The plate branch is untouched.
    assert_eq!(switched.children[0], tree.children[0]);
}

#[test]
fn round_up_all_leaves_whole_machines() {
    let catalog = sample::sample_catalog().unwrap();
    let options = ResolveOptions::default();
    let resolver = Resolver::new(&catalog, &options);
    let tree = resolver.resolve("Desc_IronPlateReinforced_C", 7.0).unwrap();
    let rounded = resolver.round_up_all(&tree).unwrap();

    rounded.walk(&mut |_, node| {
        if node.recipe().is_some() {
            assert!(node.rounded);
            assert_eq!(node.machine_count.fract(), 0.0);
            assert!(node.output_rate + 1e-9 >= node.demand_rate);
        }
    });
}

#[test]
fn catalog_survives_database_round_trip() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let (items, recipes) = sample::sample_records();
    db::save_catalog(&conn, &items, &recipes).unwrap();

    let loaded = db::load_catalog(&conn).unwrap();
    let expected = sample::sample_catalog().unwrap();
    assert_eq!(loaded.items(), expected.items());
    assert_eq!(loaded.recipes(), expected.recipes());

    let options = ResolveOptions::default();
    let from_db = Resolver::new(&loaded, &options).resolve("Desc_Cable_C", 30.0).unwrap();
    let from_memory = Resolver::new(&expected, &options).resolve("Desc_Cable_C", 30.0).unwrap();
    assert_eq!(from_db, from_memory);
}
