//! CSV export of computed reports
//!
//! Columns are stable so exported files can feed spreadsheets without
//! remapping. Unresolvable values come out as empty cells, not zeros.

use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::info;

use crate::reports::{CompositionReport, DetailReport, EvolutionReport};

fn cell(value: Option<rust_decimal::Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn export_composition<P: AsRef<Path>>(report: &CompositionReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    wtr.write_record([
        "asset",
        "quantity",
        "current_value",
        "invested",
        "sales",
        "income",
        "total_gain",
    ])?;
    for row in &report.rows {
        wtr.write_record([
            row.asset.clone(),
            row.quantity.to_string(),
            cell(row.current_value),
            row.invested.to_string(),
            row.sales.to_string(),
            row.income.to_string(),
            cell(row.total_gain),
        ])?;
    }
    wtr.flush()?;

    info!("exported {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

pub fn export_evolution<P: AsRef<Path>>(report: &EvolutionReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    wtr.write_record([
        "asset",
        "value_at_start",
        "value_at_end",
        "sales_in_period",
        "income_in_period",
        "net_change",
    ])?;
    for row in &report.rows {
        wtr.write_record([
            row.asset.clone(),
            cell(row.value_at_start),
            cell(row.value_at_end),
            row.sales_in_period.to_string(),
            row.income_in_period.to_string(),
            cell(row.net_change),
        ])?;
    }
    wtr.flush()?;

    info!("exported {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

pub fn export_detail<P: AsRef<Path>>(report: &DetailReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    wtr.write_record(["date", "operation", "quantity", "price", "amount"])?;
    for row in &report.rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.label.clone(),
            cell(row.quantity),
            cell(row.price),
            cell(row.amount),
        ])?;
    }
    wtr.flush()?;

    info!("exported {} rows to {}", report.rows.len(), path.display());
    Ok(())
}
