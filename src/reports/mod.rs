//! Report generators: composition, evolution and per-asset detail.

pub mod composition;
pub mod detail;
pub mod evolution;

pub use composition::{calculate_composition, CompositionReport, CompositionRow};
pub use detail::{asset_detail, DetailReport, DetailRow};
pub use evolution::{calculate_evolution, EvolutionReport, EvolutionRow};

use chrono::NaiveDate;
use serde::Serialize;

/// Why a value in a report is unavailable or suspect. Calculators never
/// fail a whole call over these; they flag and keep going.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No price on or before the query date; the affected value is
    /// reported as unavailable, never silently zero.
    MissingPrice,
    /// Sells exceeded the held quantity at some point in the history.
    NegativeQuantity,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub asset: String,
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl Diagnostic {
    pub fn missing_price(asset: &str, date: NaiveDate) -> Self {
        Self {
            kind: DiagnosticKind::MissingPrice,
            asset: asset.to_string(),
            date: Some(date),
            message: format!("no price for {} on or before {}", asset, date),
        }
    }

    pub fn negative_quantity(asset: &str, date: NaiveDate, quantity: rust_decimal::Decimal) -> Self {
        Self {
            kind: DiagnosticKind::NegativeQuantity,
            asset: asset.to_string(),
            date: Some(date),
            message: format!(
                "{}: sells exceed held quantity as of {} (net {})",
                asset, date, quantity
            ),
        }
    }
}
