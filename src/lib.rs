//! Cartera - portfolio valuation from an operations ledger
//!
//! This library reconstructs holdings from a CSV ledger of buys, sells
//! and income events, values them against a daily price table, and
//! produces composition and evolution reports. Positions that were sold
//! down to zero and later repurchased are valued from the current
//! holding cycle only.

pub mod cli;
pub mod engine;
pub mod error;
pub mod export;
pub mod ledger;
pub mod pricing;
pub mod reports;
pub mod utils;
