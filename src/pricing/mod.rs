//! Price lookup
//!
//! Resolves `(asset, date)` to the closing price at the latest point on
//! or before the query date. Never looks forward: an end-of-window
//! valuation must not see prices that did not exist yet.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cell of the price matrix in long form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub asset: String,
    pub price: Decimal,
}

/// All known prices, indexed per asset and sorted by date.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    by_asset: BTreeMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl PriceTable {
    pub fn new(points: Vec<PricePoint>) -> Self {
        let mut by_asset: BTreeMap<String, Vec<(NaiveDate, Decimal)>> = BTreeMap::new();
        for point in points {
            by_asset
                .entry(point.asset)
                .or_default()
                .push((point.date, point.price));
        }
        for series in by_asset.values_mut() {
            series.sort_by_key(|(date, _)| *date);
            // Keep the last quote when a date repeats
            let mut deduped: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(series.len());
            for &(date, price) in series.iter() {
                match deduped.last_mut() {
                    Some(last) if last.0 == date => last.1 = price,
                    _ => deduped.push((date, price)),
                }
            }
            *series = deduped;
        }
        Self { by_asset }
    }

    /// Nearest-available price: the latest point with `point.date <= date`,
    /// or `None` if the asset has no quote on or before that date.
    pub fn price_on(&self, asset: &str, date: NaiveDate) -> Option<Decimal> {
        let series = self.by_asset.get(asset)?;
        let idx = series.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            None
        } else {
            Some(series[idx - 1].1)
        }
    }

    pub fn has_asset(&self, asset: &str) -> bool {
        self.by_asset.contains_key(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.by_asset.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_asset.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_asset.is_empty()
    }
}
