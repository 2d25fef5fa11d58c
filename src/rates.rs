//! Rate arithmetic
//!
//! All rates are items per minute. Recipes carry amounts per cycle and a
//! cycle duration in seconds.

use crate::models::{Ingredient, Recipe};

/// Relative tolerance for comparing rates.
pub const RATE_TOLERANCE: f64 = 1e-9;

/// Primary product output of one machine running `recipe`, per minute.
///
/// Returns 0.0 for a recipe without products; the catalog never admits one.
pub fn base_rate(recipe: &Recipe) -> f64 {
    recipe
        .primary_product()
        .map_or(0.0, |product| per_minute(product.amount, recipe.duration_s))
}

/// Amount per cycle converted to items per minute.
pub fn per_minute(amount: f64, duration_s: f64) -> f64 {
    amount / duration_s * 60.0
}

/// How many machines' worth of `base_rate` is needed for `demand_rate`.
///
/// `None` when the base rate is not positive.
pub fn multiplier(demand_rate: f64, base_rate: f64) -> Option<f64> {
    if base_rate > 0.0 && base_rate.is_finite() {
        Some(demand_rate / base_rate)
    } else {
        None
    }
}

/// Machines needed for `multiplier`, optionally rounded up to a whole machine.
///
/// Multipliers within [`RATE_TOLERANCE`] of a whole machine count as that
/// many machines before rounding, so 3.0000000000000004 stays 3. Any
/// positive multiplier needs at least one machine.
pub fn machine_count(multiplier: f64, round_up: bool) -> f64 {
    if !round_up {
        return multiplier;
    }
    let nearest = multiplier.round();
    if nearest >= 1.0 && approx_eq(multiplier, nearest) {
        nearest
    } else {
        multiplier.ceil()
    }
}

pub fn rounded_output_rate(recipe: &Recipe, rounded_machine_count: f64) -> f64 {
    rounded_machine_count * base_rate(recipe)
}

/// Demand placed on an ingredient when `recipe` runs at `multiplier`.
pub fn ingredient_rate(recipe: &Recipe, ingredient: &Ingredient, multiplier: f64) -> f64 {
    multiplier * per_minute(ingredient.amount, recipe.duration_s)
}

/// Equality within [`RATE_TOLERANCE`], relative to the larger magnitude.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= RATE_TOLERANCE * scale
}

/// Round for display, e.g. `round_to(3.333333, 4) == 3.3333`.
pub fn round_to(value: f64, places: u32) -> f64 {
    let pow = 10f64.powi(places as i32);
    (value * pow).round() / pow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Machine;

    fn recipe(amount: f64, duration_s: f64) -> Recipe {
        Recipe {
            id: "Recipe_X_C".to_string(),
            name: "X".to_string(),
            ingredients: vec![Ingredient::new("Desc_Y_C", 3.0)],
            products: vec![Ingredient::new("Desc_X_C", amount)],
            machines: vec![Machine::from_id("Build_ConstructorMk1_C")],
            duration_s,
            is_event: false,
        }
    }

    #[test]
    fn base_rate_is_per_minute_primary_output() {
        assert_eq!(base_rate(&recipe(2.0, 4.0)), 30.0);
        assert_eq!(base_rate(&recipe(1.0, 2.0)), 30.0);
        assert_eq!(base_rate(&recipe(15.0, 60.0)), 15.0);
    }

    #[test]
    fn multiplier_rejects_zero_base_rate() {
        assert_eq!(multiplier(90.0, 30.0), Some(3.0));
        assert_eq!(multiplier(90.0, 0.0), None);
    }

    #[test]
    fn machine_count_rounds_only_when_asked() {
        let m = 100.0 / 30.0;
        assert_eq!(machine_count(m, false), m);
        assert_eq!(machine_count(m, true), 4.0);
        assert_eq!(machine_count(3.0, true), 3.0);
        assert_eq!(machine_count(0.1 * 30.0, true), 3.0);
    }

    #[test]
    fn tiny_multiplier_still_needs_one_machine() {
        assert_eq!(machine_count(1e-12, true), 1.0);
        assert_eq!(machine_count(5e-11, true), 1.0);
        assert_eq!(machine_count(0.0, true), 0.0);
    }

    #[test]
    fn rounded_output_uses_base_rate() {
        assert_eq!(rounded_output_rate(&recipe(2.0, 4.0), 4.0), 120.0);
    }

    #[test]
    fn ingredient_rate_scales_with_multiplier() {
        let r = recipe(2.0, 4.0);
        assert_eq!(ingredient_rate(&r, &r.ingredients[0], 3.0), 135.0);
    }

    #[test]
    fn approx_eq_tolerates_float_noise() {
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(approx_eq(3.0 * (100.0 / 3.0), 100.0));
        assert!(!approx_eq(100.0, 100.001));
    }

    #[test]
    fn round_to_four_places() {
        assert_eq!(round_to(100.0 / 30.0, 4), 3.3333);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
