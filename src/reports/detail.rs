//! Per-asset drill-down
//!
//! Lists what happened to one asset over a window: an opening position
//! row (when something was held at `start`) followed by the operations
//! of the current holding cycle that fall inside `(start, end]`.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::Diagnostic;
use crate::engine::{reconstruct, Tolerance, TraceEvent, TraceRecorder};
use crate::error::PortfolioError;
use crate::ledger::OperationLedger;
use crate::pricing::PriceTable;

#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub label: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct DetailReport {
    pub asset: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<DetailRow>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

pub fn asset_detail(
    ledger: &OperationLedger,
    prices: &PriceTable,
    asset: &str,
    start: NaiveDate,
    end: NaiveDate,
    tolerance: Tolerance,
    trace: &mut TraceRecorder,
) -> Result<DetailReport> {
    if start > end {
        anyhow::bail!(PortfolioError::InvalidDateRange {
            from: start,
            to: end
        });
    }

    let ops = ledger.operations_for(asset);
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    let rec_start = reconstruct(asset, ops, start, tolerance, trace);
    if tolerance.is_positive(rec_start.quantity_as_of) {
        let price = prices.price_on(asset, start);
        trace.record(TraceEvent::PriceUsed {
            asset: asset.to_string(),
            date: start,
            price,
        });
        if price.is_none() {
            diagnostics.push(Diagnostic::missing_price(asset, start));
        }
        rows.push(DetailRow {
            date: start,
            label: "Posición inicial".to_string(),
            quantity: Some(rec_start.quantity_as_of),
            price,
            amount: price.map(|p| rec_start.quantity_as_of * p),
        });
    }

    for op in ops.iter().filter(|op| op.date > start && op.date <= end) {
        rows.push(DetailRow {
            date: op.date,
            label: op.kind.as_str().to_string(),
            quantity: (!op.quantity.is_zero()).then_some(op.quantity),
            price: op.price,
            amount: Some(op.amount),
        });
    }

    Ok(DetailReport {
        asset: asset.to_string(),
        start,
        end,
        rows,
        diagnostics,
    })
}
