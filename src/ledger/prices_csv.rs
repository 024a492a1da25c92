use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::operations_csv::{parse_date, parse_decimal};
use super::RowIssue;
use crate::error::PortfolioError;
use crate::pricing::{PricePoint, PriceTable};

/// Parse the wide price matrix: first column a date, one further column
/// per asset id, cells empty or a closing price.
pub fn parse_prices_csv<P: AsRef<Path>>(path: P) -> Result<(PriceTable, Vec<RowIssue>)> {
    let path = path.as_ref();
    info!("Parsing prices file: {:?}", path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open prices file {:?}", path))?;
    parse_prices(file)
}

pub fn parse_prices<R: Read>(input: R) -> Result<(PriceTable, Vec<RowIssue>)> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read prices headers")?
        .clone();

    if headers.len() < 2 {
        anyhow::bail!(PortfolioError::MissingColumn(
            "prices table needs a date column plus at least one asset column".to_string()
        ));
    }

    // Column 0 is the date whatever its label; the rest are asset ids.
    let assets: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|h| h.trim().to_uppercase())
        .collect();
    debug!("Price matrix assets: {:?}", assets);

    let mut points = Vec::new();
    let mut issues = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping price row {}: {}", row_num, e);
                issues.push(RowIssue::new(row_num, "record", "", e.to_string()));
                continue;
            }
        };

        let date_str = record.get(0).map(str::trim).unwrap_or_default();
        if date_str.is_empty() {
            continue;
        }
        let date = match parse_date(date_str) {
            Ok(d) => d,
            Err(e) => {
                // Bad date invalidates the whole row.
                warn!("Skipping price row {}: {}", row_num, e);
                issues.push(RowIssue::new(row_num, "fecha", date_str, e.to_string()));
                continue;
            }
        };

        for (col, asset) in assets.iter().enumerate() {
            let cell = record.get(col + 1).map(str::trim).unwrap_or_default();
            if cell.is_empty() || asset.is_empty() {
                continue; // Sparse matrix: empty cell means no close that day
            }
            match parse_decimal(cell) {
                Ok(price) => points.push(PricePoint {
                    date,
                    asset: asset.clone(),
                    price,
                }),
                Err(e) => {
                    issues.push(RowIssue::new(row_num, asset.clone(), cell, e.to_string()));
                }
            }
        }
    }

    info!(
        "Parsed {} price points for {} assets ({} cells rejected)",
        points.len(),
        assets.iter().filter(|a| !a.is_empty()).count(),
        issues.len()
    );
    Ok((PriceTable::new(points), issues))
}
