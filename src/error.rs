//! Error types for catalog validation and chain resolution

use thiserror::Error;

/// A catalog record that cannot be handed to the resolver.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("recipe '{recipe}': malformed ingredient entry '{entry}'")]
    MalformedIngredient { recipe: String, entry: String },

    #[error("recipe '{recipe}': ingredient '{item}' has non-positive amount {amount}")]
    NonPositiveAmount {
        recipe: String,
        item: String,
        amount: f64,
    },

    #[error("recipe '{recipe}': invalid cycle duration '{value}'")]
    InvalidDuration { recipe: String, value: String },

    #[error("recipe '{recipe}' has no products")]
    NoProducts { recipe: String },

    #[error("recipe '{recipe}' has no compatible machines")]
    NoMachines { recipe: String },

    #[error("record is missing its class name")]
    MissingId,

    #[error("malformed {kind} record: {message}")]
    InvalidRecord { kind: &'static str, message: String },

    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// An item requires itself somewhere down its own ingredient chain.
    #[error("cyclic recipe chain: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("recipe '{recipe}' is not an available recipe for '{item}'")]
    RecipeNotCandidate { item: String, recipe: String },

    #[error("invalid target rate {rate}: must be a finite, non-negative number")]
    InvalidRate { rate: f64 },

    #[error("no production node at path {path}")]
    NoSuchNode { path: String },
}
