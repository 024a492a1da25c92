use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{Operation, OperationKind, RowIssue};
use crate::error::PortfolioError;

/// Parse an operations CSV file into ledger rows.
///
/// Returns the accepted operations plus the list of rejected rows. Missing
/// required columns are fatal; anything wrong with a single row rejects
/// that row only.
pub fn parse_operations_csv<P: AsRef<Path>>(path: P) -> Result<(Vec<Operation>, Vec<RowIssue>)> {
    let path = path.as_ref();
    info!("Parsing operations file: {:?}", path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open operations file {:?}", path))?;
    parse_operations(file)
}

/// Reader-based variant, used by tests and callers that already hold the data.
pub fn parse_operations<R: Read>(input: R) -> Result<(Vec<Operation>, Vec<RowIssue>)> {
    let mut reader = ReaderBuilder::new()
        .flexible(true) // Allow variable number of columns
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read operations headers")?
        .clone();
    debug!("Operations headers: {:?}", headers);

    let mapping = find_columns(&headers)?;
    debug!("Column mapping: {:?}", mapping);

    let mut operations = Vec::new();
    let mut issues = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2; // 1-indexed, after the header row
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping row {}: {}", row_num, e);
                issues.push(RowIssue::new(row_num, "record", "", e.to_string()));
                continue;
            }
        };

        match parse_row(&record, &mapping, row_num) {
            Ok(Some(op)) => operations.push(op),
            Ok(None) => continue,
            Err(issue) => {
                warn!(
                    "Skipping row {}: {} ({}='{}')",
                    issue.row, issue.reason, issue.field, issue.value
                );
                issues.push(issue);
            }
        }
    }

    info!(
        "Parsed {} operations ({} rows rejected)",
        operations.len(),
        issues.len()
    );
    Ok((operations, issues))
}

#[derive(Debug)]
struct ColumnMapping {
    date: usize,
    kind: usize,
    asset: usize,
    quantity: usize,
    amount: usize,
    price: Option<usize>,
    asset_class: Option<usize>,
}

fn find_columns(headers: &csv::StringRecord) -> Result<ColumnMapping> {
    let mut date_idx = None;
    let mut kind_idx = None;
    let mut asset_idx = None;
    let mut quantity_idx = None;
    let mut amount_idx = None;
    let mut price_idx = None;
    let mut class_idx = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = super::fold_accents(&header.to_lowercase());

        // "Tipo de activo" must win over plain "Activo"
        if text.contains("tipo") && text.contains("activo") {
            class_idx = Some(idx);
            continue;
        }

        if text.contains("fecha") || text == "date" {
            date_idx = Some(idx);
        }

        if text.contains("operacion") || text.contains("descripcion") {
            kind_idx = Some(idx);
        }

        if text.contains("activo") || text == "ric" || text.contains("ticker") {
            asset_idx = Some(idx);
        }

        if text.contains("nominales") || text.contains("cantidad") {
            quantity_idx = Some(idx);
        }

        if text.contains("precio") {
            price_idx = Some(idx);
        }

        if text.contains("valor") || text.contains("monto") || text.contains("importe") {
            amount_idx = Some(idx);
        }
    }

    let require = |idx: Option<usize>, name: &str| {
        idx.ok_or_else(|| anyhow!(PortfolioError::MissingColumn(name.to_string())))
    };

    Ok(ColumnMapping {
        date: require(date_idx, "Fecha")?,
        kind: require(kind_idx, "Operación")?,
        asset: require(asset_idx, "Activo")?,
        quantity: require(quantity_idx, "Nominales")?,
        amount: require(amount_idx, "Valor")?,
        price: price_idx,
        asset_class: class_idx,
    })
}

fn parse_row(
    record: &csv::StringRecord,
    mapping: &ColumnMapping,
    row_num: usize,
) -> std::result::Result<Option<Operation>, RowIssue> {
    // Empty asset cell means a blank/filler row; skip silently.
    let asset = record
        .get(mapping.asset)
        .map(str::trim)
        .unwrap_or_default()
        .to_uppercase();
    if asset.is_empty() {
        return Ok(None);
    }

    let kind_str = record.get(mapping.kind).map(str::trim).unwrap_or_default();
    let kind = OperationKind::from_str(kind_str).map_err(|_| {
        RowIssue::new(
            row_num,
            "operacion",
            kind_str,
            format!("unknown operation kind '{}'", kind_str),
        )
    })?;

    let date_str = record.get(mapping.date).map(str::trim).unwrap_or_default();
    let date = parse_date(date_str)
        .map_err(|e| RowIssue::new(row_num, "fecha", date_str, e.to_string()))?;

    let quantity_str = record
        .get(mapping.quantity)
        .map(str::trim)
        .unwrap_or_default();
    let raw_quantity = if quantity_str.is_empty() && kind.is_income() {
        // Income rows often omit the quantity column.
        Decimal::ZERO
    } else {
        parse_decimal(quantity_str)
            .map_err(|e| RowIssue::new(row_num, "nominales", quantity_str, e.to_string()))?
    };

    // Sells may arrive with negative quantities; fold to the positive
    // convention. Any other negative quantity is rejected.
    let quantity = if raw_quantity < Decimal::ZERO {
        if kind == OperationKind::Sell {
            raw_quantity.abs()
        } else {
            return Err(RowIssue::new(
                row_num,
                "nominales",
                quantity_str,
                "negative quantity after normalization",
            ));
        }
    } else {
        raw_quantity
    };

    let price = mapping
        .price
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| parse_decimal(s).ok());

    let amount_str = record
        .get(mapping.amount)
        .map(str::trim)
        .unwrap_or_default();
    let amount = if amount_str.is_empty() {
        match price {
            // Fall back to quantity × price when the total cell is blank.
            Some(p) => quantity * p,
            None => {
                return Err(RowIssue::new(
                    row_num,
                    "valor",
                    amount_str,
                    "missing amount and no price to derive it from",
                ))
            }
        }
    } else {
        parse_decimal(amount_str)
            .map_err(|e| RowIssue::new(row_num, "valor", amount_str, e.to_string()))?
            .abs()
    };

    let asset_class = mapping
        .asset_class
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Some(Operation {
        date,
        kind,
        asset_class,
        asset,
        quantity,
        price,
        amount,
    }))
}

/// Parse a date accepting ISO and day-first forms.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%d/%m/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%d-%m-%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%d/%m/%y") {
        return Ok(date);
    }

    Err(anyhow!("Could not parse date: {}", date_str))
}

/// Parse a decimal cell, tolerating currency symbols and either separator
/// convention ("1.234,56" and "1,234.56").
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ' ' | '\u{a0}'))
        .collect();

    if cleaned.is_empty() {
        return Err(anyhow!("empty numeric cell"));
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Comma after dot: dot is the thousands separator
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        // Dot after comma: comma is the thousands separator
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // Comma only: decimal comma
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .with_context(|| format!("Failed to parse decimal '{}'", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
Fecha,Operación,Tipo de activo,Activo,Nominales,Precio,Valor
2024-01-10,Compra,Bono,AL30,1000,95.50,95500
01/03/2024,Venta,Bono,AL30,-1000,100,-100000
2024-04-15,Cupón,Bono,AL30,,,3500
2024-05-01,Canje,Bono,AL30,10,1,10
bad-date,Compra,Bono,GD35,10,1,10
2024-05-02,Compra,Acción,GGAL,-5,10,50
";

    #[test]
    fn test_parse_accepts_good_rows_and_rejects_bad_ones() {
        let (ops, issues) = parse_operations(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(issues.len(), 3);

        // Sell quantity and amount are folded to positive
        assert_eq!(ops[1].kind, OperationKind::Sell);
        assert_eq!(ops[1].quantity, dec!(1000));
        assert_eq!(ops[1].amount, dec!(100000));

        // Income row with empty quantity
        assert_eq!(ops[2].kind, OperationKind::Coupon);
        assert_eq!(ops[2].quantity, Decimal::ZERO);
        assert_eq!(ops[2].amount, dec!(3500));

        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["operacion", "fecha", "nominales"]);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let headers_only = "Fecha,Operación,Nominales,Valor\n";
        let err = parse_operations(headers_only.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Activo"));
    }

    #[test]
    fn test_class_column_does_not_steal_asset_column() {
        let data = "Fecha,Tipo de activo,Activo,Operación,Nominales,Valor\n\
                    2024-01-01,Bono,AL30,Compra,10,950\n";
        let (ops, issues) = parse_operations(data.as_bytes()).unwrap();
        assert!(issues.is_empty());
        assert_eq!(ops[0].asset, "AL30");
        assert_eq!(ops[0].asset_class.as_deref(), Some("Bono"));
    }

    #[test]
    fn test_amount_falls_back_to_quantity_times_price() {
        let data = "Fecha,Operación,Activo,Nominales,Precio,Valor\n\
                    2024-01-01,Compra,AL30,100,95.50,\n";
        let (ops, issues) = parse_operations(data.as_bytes()).unwrap();
        assert!(issues.is_empty());
        assert_eq!(ops[0].amount, dec!(9550.00));
    }

    #[test]
    fn test_parse_decimal_separator_conventions() {
        assert_eq!(parse_decimal("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("$ 10,50").unwrap(), dec!(10.50));
        assert_eq!(parse_decimal("95500").unwrap(), dec!(95500));
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15").unwrap(), expected);
        assert_eq!(parse_date("15/03/2024").unwrap(), expected);
        assert_eq!(parse_date("15-03-2024").unwrap(), expected);
        assert!(parse_date("soon").is_err());
    }
}
