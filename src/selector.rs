//! Recipe selection for a target item

use crate::catalog::Catalog;
use crate::models::RecipeCandidate;

/// Recipes producing `item_id`, in catalog order.
///
/// Event recipes are hidden unless `include_events` is set.
pub fn select_candidates(catalog: &Catalog, item_id: &str, include_events: bool) -> Vec<RecipeCandidate> {
    catalog
        .recipes_producing(item_id)
        .filter(|recipe| include_events || !recipe.is_event)
        .map(|recipe| RecipeCandidate {
            recipe_id: recipe.id.clone(),
            name: recipe.name.clone(),
        })
        .collect()
}

/// First candidate that is not an alternate recipe, else the first candidate.
///
/// This is a fixed convention, not a judgement of which recipe is best.
pub fn default_choice(candidates: &[RecipeCandidate]) -> Option<&RecipeCandidate> {
    candidates
        .iter()
        .find(|c| !c.name.contains("Alternate"))
        .or_else(|| candidates.first())
}
