//! Current composition calculator
//!
//! One row per asset still held at the reference date, valued at the
//! nearest available price, with invested/sales/income accumulated since
//! the last reset to zero. Pure function of the input tables and the
//! explicit `as_of` date; the engine never reads the clock.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::Diagnostic;
use crate::engine::{reconstruct, Tolerance, TraceEvent, TraceRecorder};
use crate::ledger::OperationLedger;
use crate::pricing::PriceTable;

#[derive(Debug, Clone, Serialize)]
pub struct CompositionRow {
    pub asset: String,
    pub asset_class: Option<String>,
    pub quantity: Decimal,
    pub current_price: Option<Decimal>,
    /// `None` when no price could be resolved; flagged, not zeroed.
    pub current_value: Option<Decimal>,
    pub invested: Decimal,
    pub sales: Decimal,
    pub income: Decimal,
    /// `(current_value − invested) + sales + income`; `None` when the
    /// value is unavailable.
    pub total_gain: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CompositionReport {
    pub as_of: NaiveDate,
    pub rows: Vec<CompositionRow>,
    pub total_value: Decimal,
    pub total_invested: Decimal,
    /// `Σ(sales + income − invested)` over held assets.
    pub net_flows: Decimal,
    pub total_gain: Decimal,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Compute the portfolio composition as of a date.
///
/// Assets whose net quantity is not positive (within tolerance) are
/// excluded from the holdings view; an asset driven negative by
/// oversells is excluded too but surfaces as a diagnostic.
pub fn calculate_composition(
    ledger: &OperationLedger,
    prices: &PriceTable,
    as_of: NaiveDate,
    tolerance: Tolerance,
    trace: &mut TraceRecorder,
) -> CompositionReport {
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    for asset in ledger.asset_ids() {
        let ops = ledger.operations_for(&asset);
        let rec = reconstruct(&asset, ops, as_of, tolerance, trace);

        if rec.quantity_as_of < -tolerance.epsilon() {
            diagnostics.push(Diagnostic::negative_quantity(
                &asset,
                as_of,
                rec.quantity_as_of,
            ));
        }
        if !tolerance.is_positive(rec.quantity_as_of) {
            debug!("{}: nothing held as of {}, excluded", asset, as_of);
            continue;
        }

        let current_price = prices.price_on(&asset, as_of);
        trace.record(TraceEvent::PriceUsed {
            asset: asset.clone(),
            date: as_of,
            price: current_price,
        });
        if current_price.is_none() {
            diagnostics.push(Diagnostic::missing_price(&asset, as_of));
        }

        let invested = rec.invested();
        let sales = rec.sales();
        let income = rec.income();
        let current_value = current_price.map(|p| rec.quantity_as_of * p);
        let total_gain = current_value.map(|v| (v - invested) + sales + income);

        rows.push(CompositionRow {
            asset: asset.clone(),
            asset_class: ledger.asset_class_of(&asset).map(str::to_string),
            quantity: rec.quantity_as_of,
            current_price,
            current_value,
            invested,
            sales,
            income,
            total_gain,
        });
    }

    // Largest positions first; unpriced rows sort by invested amount
    rows.sort_by(|a, b| {
        let a_val = a.current_value.unwrap_or(a.invested);
        let b_val = b.current_value.unwrap_or(b.invested);
        b_val.cmp(&a_val)
    });

    let total_value = rows
        .iter()
        .filter_map(|r| r.current_value)
        .fold(Decimal::ZERO, |acc, v| acc + v);
    let total_invested = rows
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc + r.invested);
    let net_flows = rows
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc + r.sales + r.income - r.invested);
    let total_gain = rows
        .iter()
        .filter_map(|r| r.total_gain)
        .fold(Decimal::ZERO, |acc, g| acc + g);

    CompositionReport {
        as_of,
        rows,
        total_value,
        total_invested,
        net_flows,
        total_gain,
        diagnostics,
    }
}
