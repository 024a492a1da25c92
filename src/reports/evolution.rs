//! Evolution calculator
//!
//! Change in holdings and value over a `[start, end]` window. An asset is
//! eligible if it held a positive quantity at any point inside the
//! window, not only at the endpoints. Start and end are valued by two
//! independent reconstructions anchored at their own dates, which is what
//! makes a full liquidation and repurchase inside the window come out
//! right.
//!
//! `value_at_start` deliberately mixes a stock measure with a flow
//! measure: the holding valued as of `start` plus the purchases made
//! during the window (capital committed within the period). Purchases
//! after an in-window reset belong to the next cycle and are not added.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::Diagnostic;
use crate::engine::{held_within, reconstruct, Tolerance, TraceEvent, TraceRecorder};
use crate::error::PortfolioError;
use crate::ledger::{Operation, OperationKind, OperationLedger};
use crate::pricing::PriceTable;

#[derive(Debug, Clone, Serialize)]
pub struct EvolutionRow {
    pub asset: String,
    pub quantity_at_end: Decimal,
    /// Holding value as of `start` plus in-window purchases before any
    /// in-window reset; `None` when the start price is needed but
    /// unresolvable.
    pub value_at_start: Option<Decimal>,
    pub value_at_end: Option<Decimal>,
    /// Sell amounts in `(start, end]`.
    pub sales_in_period: Decimal,
    /// Coupon + dividend + amortization amounts in `(start, end]`.
    pub income_in_period: Decimal,
    /// `(value_at_end − value_at_start) + sales + income`.
    pub net_change: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct EvolutionReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<EvolutionRow>,
    pub total_value_at_start: Decimal,
    pub total_value_at_end: Decimal,
    pub total_sales: Decimal,
    pub total_income: Decimal,
    pub total_net_change: Decimal,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Compute the portfolio evolution over `[start, end]`.
///
/// Fails only on an inverted date range; per-asset problems become
/// diagnostics on the returned report.
pub fn calculate_evolution(
    ledger: &OperationLedger,
    prices: &PriceTable,
    start: NaiveDate,
    end: NaiveDate,
    tolerance: Tolerance,
    trace: &mut TraceRecorder,
) -> Result<EvolutionReport> {
    if start > end {
        anyhow::bail!(PortfolioError::InvalidDateRange {
            from: start,
            to: end
        });
    }

    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    for asset in ledger.asset_ids() {
        let ops = ledger.operations_for(&asset);

        let eligible = held_within(ops, start, end, tolerance);
        trace.record(TraceEvent::Eligibility {
            asset: asset.clone(),
            start,
            end,
            eligible,
        });
        if !eligible {
            debug!("{}: never held within [{}, {}], excluded", asset, start, end);
            continue;
        }

        // Two independent reconstructions anchored at their own dates.
        let rec_start = reconstruct(&asset, ops, start, tolerance, trace);
        let rec_end = reconstruct(&asset, ops, end, tolerance, trace);

        if rec_end.quantity_as_of < -tolerance.epsilon() {
            diagnostics.push(Diagnostic::negative_quantity(
                &asset,
                end,
                rec_end.quantity_as_of,
            ));
        }

        let window_ops: Vec<&Operation> = ops
            .iter()
            .filter(|op| op.date > start && op.date <= end)
            .collect();

        let sales_in_period: Decimal = window_ops
            .iter()
            .filter(|op| op.kind == OperationKind::Sell)
            .map(|op| op.amount)
            .sum();
        let income_in_period: Decimal = window_ops
            .iter()
            .filter(|op| op.kind.is_income())
            .map(|op| op.amount)
            .sum();

        // Purchases committed within the window, cut off at an in-window
        // reset: the end anchor's reset date, when it falls after `start`.
        let purchase_cutoff = rec_end.last_reset.filter(|reset| *reset > start);
        let purchases_in_window: Decimal = window_ops
            .iter()
            .filter(|op| op.kind == OperationKind::Buy)
            .filter(|op| purchase_cutoff.is_none_or(|cutoff| op.date <= cutoff))
            .map(|op| op.amount)
            .sum();

        let value_at_start = boundary_value(
            &asset,
            rec_start.quantity_as_of,
            start,
            prices,
            tolerance,
            trace,
            &mut diagnostics,
        )
        .map(|stock| stock + purchases_in_window);

        let value_at_end = boundary_value(
            &asset,
            rec_end.quantity_as_of,
            end,
            prices,
            tolerance,
            trace,
            &mut diagnostics,
        );

        let net_change = match (value_at_start, value_at_end) {
            (Some(vs), Some(ve)) => Some((ve - vs) + sales_in_period + income_in_period),
            _ => None,
        };

        rows.push(EvolutionRow {
            asset: asset.clone(),
            quantity_at_end: rec_end.quantity_as_of,
            value_at_start,
            value_at_end,
            sales_in_period,
            income_in_period,
            net_change,
        });
    }

    rows.sort_by(|a, b| {
        let a_val = a.value_at_end.unwrap_or(Decimal::ZERO);
        let b_val = b.value_at_end.unwrap_or(Decimal::ZERO);
        b_val.cmp(&a_val)
    });

    let total_value_at_start = sum_available(rows.iter().map(|r| r.value_at_start));
    let total_value_at_end = sum_available(rows.iter().map(|r| r.value_at_end));
    let total_sales = rows
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc + r.sales_in_period);
    let total_income = rows
        .iter()
        .fold(Decimal::ZERO, |acc, r| acc + r.income_in_period);
    let total_net_change = sum_available(rows.iter().map(|r| r.net_change));

    Ok(EvolutionReport {
        start,
        end,
        rows,
        total_value_at_start,
        total_value_at_end,
        total_sales,
        total_income,
        total_net_change,
        diagnostics,
    })
}

/// Value a boundary holding: zero when nothing is held (no price
/// needed), `quantity × price` otherwise, `None` plus a diagnostic when
/// the needed price cannot be resolved.
fn boundary_value(
    asset: &str,
    quantity: Decimal,
    date: NaiveDate,
    prices: &PriceTable,
    tolerance: Tolerance,
    trace: &mut TraceRecorder,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Decimal> {
    if !tolerance.is_positive(quantity) {
        return Some(Decimal::ZERO);
    }

    let price = prices.price_on(asset, date);
    trace.record(TraceEvent::PriceUsed {
        asset: asset.to_string(),
        date,
        price,
    });
    match price {
        Some(p) => Some(quantity * p),
        None => {
            diagnostics.push(Diagnostic::missing_price(asset, date));
            None
        }
    }
}

fn sum_available(values: impl Iterator<Item = Option<Decimal>>) -> Decimal {
    values.flatten().fold(Decimal::ZERO, |acc, v| acc + v)
}
