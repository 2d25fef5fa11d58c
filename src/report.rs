//! Surplus and deficit reporting
//!
//! Compares what a node was asked for with what it actually produces. This
//! is observational only; nothing here changes a tree.

use crate::models::{NodePath, ProductionNode};
use crate::rates::{approx_eq, round_to};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Balance {
    Balanced,
    /// Producing this much more than required, per minute
    Surplus(f64),
    /// Producing this much less than required, per minute
    Deficit(f64),
}

impl Balance {
    pub fn compare(demand_rate: f64, output_rate: f64) -> Self {
        if approx_eq(demand_rate, output_rate) {
            Balance::Balanced
        } else if output_rate > demand_rate {
            Balance::Surplus(output_rate - demand_rate)
        } else {
            Balance::Deficit(demand_rate - output_rate)
        }
    }

    pub fn is_balanced(&self) -> bool {
        matches!(self, Balance::Balanced)
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Balance::Balanced => write!(f, "balanced"),
            Balance::Surplus(extra) => write!(f, "producing {}/m extra", round_to(*extra, 4)),
            Balance::Deficit(short) => {
                write!(f, "producing {}/m less than required", round_to(*short, 4))
            }
        }
    }
}

/// Balance of a recipe-backed node. Raw and unresolved nodes have none.
pub fn node_balance(node: &ProductionNode) -> Option<Balance> {
    node.recipe()?;
    Some(Balance::compare(node.demand_rate, node.output_rate))
}

/// A node whose output differs from its demand
#[derive(Debug, Clone, PartialEq)]
pub struct Imbalance {
    pub path: NodePath,
    pub item_id: String,
    pub item_name: String,
    pub balance: Balance,
}

/// Every unbalanced node of a tree, depth-first.
pub fn imbalances(root: &ProductionNode) -> Vec<Imbalance> {
    let mut found = Vec::new();
    root.walk(&mut |path, node| {
        if let Some(balance) = node_balance(node).filter(|b| !b.is_balanced()) {
            found.push(Imbalance {
                path: path.clone(),
                item_id: node.item_id.clone(),
                item_name: node.item_name.clone(),
                balance,
            });
        }
    });
    found
}
