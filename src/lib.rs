//! Satisfactory Production Calculator
//!
//! Works out, for a target item and rate, which recipes to run, how many
//! machines each needs, and how much raw resource the chain draws.
//!
//! - [`extract`] reads the game's docs JSON into items and recipes
//! - [`db`] stores the catalog in SQLite
//! - [`catalog`] validates it and answers lookups
//! - [`selector`] and [`rates`] pick recipes and do the per-minute arithmetic
//! - [`calculator`] builds the production tree
//! - [`report`] flags nodes producing more or less than required

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod rates;
pub mod report;
pub mod sample;
pub mod selector;
