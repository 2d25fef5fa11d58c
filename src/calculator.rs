//! Production chain calculator logic

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::ResolveError;
use crate::models::{
    is_raw_resource, NodeKind, NodePath, ProductionNode, Recipe, RecipeCandidate,
};
use crate::rates::{self, round_to};
use crate::report::{node_balance, Balance};
use crate::selector::{default_choice, select_candidates};

/// Options that apply at every node of a resolution
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Offer event recipes as candidates
    pub include_events: bool,
    /// Recipe to use for an item instead of the default choice, keyed by item id
    pub recipe_choices: HashMap<String, String>,
}

impl ResolveOptions {
    pub fn with_events(include_events: bool) -> Self {
        ResolveOptions {
            include_events,
            ..Default::default()
        }
    }
}

/// Builds production trees from a catalog.
///
/// Every operation returns a new tree; nothing is mutated in place. Edits to
/// a node re-derive that node's subtree and leave its demand untouched.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    options: &'a ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, options: &'a ResolveOptions) -> Self {
        Resolver { catalog, options }
    }

    /// Calculate the production chain for `item_id` at `demand_rate` items/min.
    ///
    /// Non-finite or negative rates are rejected before anything is built.
    pub fn resolve(&self, item_id: &str, demand_rate: f64) -> Result<ProductionNode, ResolveError> {
        if !demand_rate.is_finite() || demand_rate < 0.0 {
            return Err(ResolveError::InvalidRate { rate: demand_rate });
        }
        self.resolve_node(item_id, demand_rate, &mut Vec::new())
    }

    /// Output of one machine running the recipe this resolver would pick for
    /// `item_id`. `None` for raw and unresolved items.
    pub fn one_machine_rate(&self, item_id: &str) -> Option<f64> {
        if is_raw_resource(item_id) {
            return None;
        }
        self.catalog.item(item_id)?;
        let candidates = select_candidates(self.catalog, item_id, self.options.include_events);
        self.pick_recipe(item_id, &candidates).map(rates::base_rate)
    }

    /// Round the node's machine count up to a whole number.
    ///
    /// Output rises to match and the children are re-derived from the new
    /// multiplier. Raw and unresolved nodes come back unchanged.
    pub fn apply_round_up(&self, node: &ProductionNode) -> Result<ProductionNode, ResolveError> {
        self.round_up_in(node, &mut Vec::new())
    }

    /// Manually set the node's realized output rate.
    ///
    /// Non-finite or negative rates are ignored and the prior rate is kept.
    pub fn set_rate(&self, node: &ProductionNode, rate: f64) -> Result<ProductionNode, ResolveError> {
        self.set_rate_in(node, rate, &mut Vec::new())
    }

    /// Manually set the rate from user text; unparseable input keeps the prior rate.
    pub fn edit_rate(&self, node: &ProductionNode, input: &str) -> Result<ProductionNode, ResolveError> {
        match input.trim().parse::<f64>() {
            Ok(rate) => self.set_rate(node, rate),
            Err(_) => {
                warn!(item = %node.item_id, input, "ignoring non-numeric rate");
                Ok(node.clone())
            }
        }
    }

    /// Re-resolve the node with a specific recipe from its candidates.
    pub fn choose_recipe(&self, node: &ProductionNode, recipe_id: &str) -> Result<ProductionNode, ResolveError> {
        self.choose_recipe_in(node, recipe_id, &mut Vec::new())
    }

    /// Round every recipe node up, from the root down.
    pub fn round_up_all(&self, node: &ProductionNode) -> Result<ProductionNode, ResolveError> {
        self.round_up_all_in(node, &mut Vec::new())
    }

    pub fn round_up_at(&self, root: &ProductionNode, path: &NodePath) -> Result<ProductionNode, ResolveError> {
        self.update_at(root, path, |resolver, node, active| resolver.round_up_in(node, active))
    }

    pub fn set_rate_at(
        &self,
        root: &ProductionNode,
        path: &NodePath,
        rate: f64,
    ) -> Result<ProductionNode, ResolveError> {
        self.update_at(root, path, |resolver, node, active| {
            resolver.set_rate_in(node, rate, active)
        })
    }

    pub fn choose_recipe_at(
        &self,
        root: &ProductionNode,
        path: &NodePath,
        recipe_id: &str,
    ) -> Result<ProductionNode, ResolveError> {
        self.update_at(root, path, |resolver, node, active| {
            resolver.choose_recipe_in(node, recipe_id, active)
        })
    }

    /// Replace the node at `path` with the result of `op`, rebuilding the
    /// ancestors around it. `op` receives the item ids of the ancestors so
    /// cycles introduced by the edit are still caught.
    pub fn update_at<F>(&self, root: &ProductionNode, path: &NodePath, op: F) -> Result<ProductionNode, ResolveError>
    where
        F: FnOnce(&Self, &ProductionNode, &mut Vec<String>) -> Result<ProductionNode, ResolveError>,
    {
        let mut active = Vec::new();
        self.update_inner(root, path.indices(), path, op, &mut active)
    }

    fn update_inner<F>(
        &self,
        node: &ProductionNode,
        remaining: &[usize],
        full_path: &NodePath,
        op: F,
        active: &mut Vec<String>,
    ) -> Result<ProductionNode, ResolveError>
    where
        F: FnOnce(&Self, &ProductionNode, &mut Vec<String>) -> Result<ProductionNode, ResolveError>,
    {
        let Some((&index, rest)) = remaining.split_first() else {
            return op(self, node, active);
        };
        let child = node.children.get(index).ok_or_else(|| ResolveError::NoSuchNode {
            path: full_path.to_string(),
        })?;

        active.push(node.item_id.clone());
        let updated = self.update_inner(child, rest, full_path, op, active);
        active.pop();

        let mut rebuilt = node.clone();
        rebuilt.children[index] = updated?;
        Ok(rebuilt)
    }

    fn resolve_node(
        &self,
        item_id: &str,
        demand_rate: f64,
        active: &mut Vec<String>,
    ) -> Result<ProductionNode, ResolveError> {
        if is_raw_resource(item_id) {
            return Ok(self.leaf(item_id, NodeKind::Raw, Vec::new(), demand_rate));
        }

        if active.iter().any(|id| id == item_id) {
            let mut path = active.clone();
            path.push(item_id.to_string());
            return Err(ResolveError::Cycle { path });
        }

        if self.catalog.item(item_id).is_none() {
            debug!(item = item_id, "unknown item");
            return Ok(self.leaf(item_id, NodeKind::Unresolved, Vec::new(), demand_rate));
        }

        let candidates = select_candidates(self.catalog, item_id, self.options.include_events);
        let Some(recipe) = self.pick_recipe(item_id, &candidates) else {
            debug!(item = item_id, "no recipe produces item");
            return Ok(self.leaf(item_id, NodeKind::Unresolved, candidates, demand_rate));
        };

        debug!(item = item_id, recipe = %recipe.id, demand_rate, "resolving");
        self.produced(item_id, recipe, candidates, demand_rate, demand_rate, false, active)
    }

    /// The user's choice for this item if it is a visible candidate, else the default.
    fn pick_recipe(&self, item_id: &str, candidates: &[RecipeCandidate]) -> Option<&'a Recipe> {
        if let Some(chosen) = self.options.recipe_choices.get(item_id) {
            if candidates.iter().any(|c| &c.recipe_id == chosen) {
                return self.catalog.recipe(chosen);
            }
            warn!(item = item_id, recipe = %chosen, "chosen recipe is not available, using default");
        }
        default_choice(candidates).and_then(|c| self.catalog.recipe(&c.recipe_id))
    }

    fn leaf(
        &self,
        item_id: &str,
        kind: NodeKind,
        candidates: Vec<RecipeCandidate>,
        demand_rate: f64,
    ) -> ProductionNode {
        ProductionNode {
            item_id: item_id.to_string(),
            item_name: self.catalog.item_name(item_id).to_string(),
            kind,
            candidates,
            demand_rate,
            output_rate: demand_rate,
            multiplier: 0.0,
            machine_count: 0.0,
            rounded: false,
            children: Vec::new(),
        }
    }

    /// Build a recipe-backed node producing `output_rate`, resolving one
    /// child per ingredient.
    #[allow(clippy::too_many_arguments)]
    fn produced(
        &self,
        item_id: &str,
        recipe: &Recipe,
        candidates: Vec<RecipeCandidate>,
        demand_rate: f64,
        output_rate: f64,
        rounded: bool,
        active: &mut Vec<String>,
    ) -> Result<ProductionNode, ResolveError> {
        // Catalog validation keeps the base rate positive.
        let multiplier = rates::multiplier(output_rate, rates::base_rate(recipe)).unwrap_or(0.0);

        active.push(item_id.to_string());
        let children: Result<Vec<_>, _> = recipe
            .ingredients
            .iter()
            .map(|ingredient| {
                let rate = rates::ingredient_rate(recipe, ingredient, multiplier);
                self.resolve_node(&ingredient.item_id, rate, active)
            })
            .collect();
        active.pop();

        Ok(ProductionNode {
            item_id: item_id.to_string(),
            item_name: self.catalog.item_name(item_id).to_string(),
            kind: NodeKind::Produced(recipe.clone()),
            candidates,
            demand_rate,
            output_rate,
            multiplier,
            machine_count: rates::machine_count(multiplier, rounded),
            rounded,
            children: children?,
        })
    }

    fn round_up_in(&self, node: &ProductionNode, active: &mut Vec<String>) -> Result<ProductionNode, ResolveError> {
        let Some(recipe) = node.recipe() else {
            return Ok(node.clone());
        };
        let machines = rates::machine_count(node.multiplier, true);
        let output_rate = rates::rounded_output_rate(recipe, machines);
        debug!(item = %node.item_id, machines, output_rate, "rounding up");
        self.produced(
            &node.item_id,
            recipe,
            node.candidates.clone(),
            node.demand_rate,
            output_rate,
            true,
            active,
        )
    }

    fn set_rate_in(
        &self,
        node: &ProductionNode,
        rate: f64,
        active: &mut Vec<String>,
    ) -> Result<ProductionNode, ResolveError> {
        if !rate.is_finite() || rate < 0.0 {
            warn!(item = %node.item_id, rate, "ignoring invalid rate");
            return Ok(node.clone());
        }
        let Some(recipe) = node.recipe() else {
            debug!(item = %node.item_id, "rate edits only apply to recipe nodes");
            return Ok(node.clone());
        };
        self.produced(
            &node.item_id,
            recipe,
            node.candidates.clone(),
            node.demand_rate,
            rate,
            false,
            active,
        )
    }

    fn choose_recipe_in(
        &self,
        node: &ProductionNode,
        recipe_id: &str,
        active: &mut Vec<String>,
    ) -> Result<ProductionNode, ResolveError> {
        let candidates = select_candidates(self.catalog, &node.item_id, self.options.include_events);
        let recipe = candidates
            .iter()
            .any(|c| c.recipe_id == recipe_id)
            .then(|| self.catalog.recipe(recipe_id))
            .flatten()
            .ok_or_else(|| ResolveError::RecipeNotCandidate {
                item: node.item_id.clone(),
                recipe: recipe_id.to_string(),
            })?;
        self.produced(
            &node.item_id,
            recipe,
            candidates,
            node.demand_rate,
            node.output_rate,
            false,
            active,
        )
    }

    fn round_up_all_in(&self, node: &ProductionNode, active: &mut Vec<String>) -> Result<ProductionNode, ResolveError> {
        let mut rounded = self.round_up_in(node, active)?;
        active.push(node.item_id.clone());
        let children: Result<Vec<_>, _> = rounded
            .children
            .iter()
            .map(|child| self.round_up_all_in(child, active))
            .collect();
        active.pop();
        rounded.children = children?;
        Ok(rounded)
    }
}

/// Format a production chain as a readable string
pub fn format_production_chain(node: &ProductionNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    match &node.kind {
        NodeKind::Raw => {
            output.push_str(&format!(
                "{}Need {}/m of {} (raw)\n",
                prefix,
                round_to(node.demand_rate, 4),
                node.item_name
            ));
        }
        NodeKind::Unresolved => {
            output.push_str(&format!(
                "{}Need {}/m of {} (no available recipe)\n",
                prefix,
                round_to(node.demand_rate, 4),
                node.item_name
            ));
        }
        NodeKind::Produced(recipe) => {
            output.push_str(&format!(
                "{}Need {}/m {} [{}]\n",
                prefix,
                round_to(node.output_rate, 4),
                node.item_name,
                recipe.name
            ));
            output.push_str(&format!(
                "{}  Using {}x {} with {}/m{}\n",
                prefix,
                round_to(node.machine_count, 4),
                recipe.machine_name(),
                round_to(rates::base_rate(recipe), 4),
                if node.rounded { " (rounded up)" } else { "" }
            ));
            match node_balance(node) {
                Some(Balance::Surplus(extra)) => output.push_str(&format!(
                    "{}  Producing {}/m extra!\n",
                    prefix,
                    round_to(extra, 4)
                )),
                Some(Balance::Deficit(short)) => output.push_str(&format!(
                    "{}  Producing {}/m less than required!\n",
                    prefix,
                    round_to(short, 4)
                )),
                _ => {}
            }
            for child in &node.children {
                output.push_str(&format_production_chain(child, indent + 2));
            }
        }
    }

    output
}

/// Machines of one type running one recipe
#[derive(Debug, Clone, PartialEq)]
pub struct MachineTally {
    pub machine: String,
    pub recipe: String,
    pub count: f64,
}

/// Summary of a production chain calculation
#[derive(Debug)]
pub struct ChainSummary {
    pub target_item: String,
    pub target_rate: f64,
    pub machines: Vec<MachineTally>,
    pub raw_inputs: Vec<(String, f64)>,
    pub unresolved: Vec<(String, f64)>,
    pub imbalanced_nodes: usize,
}

/// Generate a summary of the production chain
pub fn summarize_chain(node: &ProductionNode) -> ChainSummary {
    let mut machines: HashMap<(String, String), f64> = HashMap::new();
    let mut raw_inputs: HashMap<String, f64> = HashMap::new();
    let mut unresolved: HashMap<String, f64> = HashMap::new();
    let mut imbalanced_nodes = 0;

    node.walk(&mut |_, n| match &n.kind {
        NodeKind::Raw => *raw_inputs.entry(n.item_name.clone()).or_default() += n.demand_rate,
        NodeKind::Unresolved => *unresolved.entry(n.item_name.clone()).or_default() += n.demand_rate,
        NodeKind::Produced(recipe) => {
            *machines
                .entry((recipe.machine_name().to_string(), recipe.name.clone()))
                .or_default() += n.machine_count;
            if node_balance(n).is_some_and(|b| !b.is_balanced()) {
                imbalanced_nodes += 1;
            }
        }
    });

    let mut machine_list: Vec<_> = machines
        .into_iter()
        .map(|((machine, recipe), count)| MachineTally {
            machine,
            recipe,
            count,
        })
        .collect();
    machine_list.sort_by(|a, b| a.machine.cmp(&b.machine).then_with(|| a.recipe.cmp(&b.recipe)));

    let mut raw_list: Vec<_> = raw_inputs.into_iter().collect();
    raw_list.sort_by(|a, b| a.0.cmp(&b.0));

    let mut unresolved_list: Vec<_> = unresolved.into_iter().collect();
    unresolved_list.sort_by(|a, b| a.0.cmp(&b.0));

    ChainSummary {
        target_item: node.item_name.clone(),
        target_rate: node.output_rate,
        machines: machine_list,
        raw_inputs: raw_list,
        unresolved: unresolved_list,
        imbalanced_nodes,
    }
}

impl std::fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} @ {}/m", self.target_item, round_to(self.target_rate, 4))?;
        writeln!(f)?;

        writeln!(f, "Machines required:")?;
        for tally in &self.machines {
            writeln!(
                f,
                "  {:>9}x {} ({})",
                round_to(tally.count, 4),
                tally.machine,
                tally.recipe
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for (name, rate) in &self.raw_inputs {
            writeln!(f, "  {} @ {}/m", name, round_to(*rate, 4))?;
        }

        if !self.unresolved.is_empty() {
            writeln!(f)?;
            writeln!(f, "No available recipe:")?;
            for (name, rate) in &self.unresolved {
                writeln!(f, "  {} @ {}/m", name, round_to(*rate, 4))?;
            }
        }

        if self.imbalanced_nodes > 0 {
            writeln!(f)?;
            writeln!(f, "{} node(s) produce more or less than required", self.imbalanced_nodes)?;
        }

        Ok(())
    }
}
