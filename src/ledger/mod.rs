//! Ledger data model
//!
//! Operations are immutable records grouped and totally ordered by
//! `(asset, date)`; ties at the same date keep input order. Sells are
//! stored with positive quantities and amounts; the sign is applied by
//! the engine, never assumed from the source data.

pub mod operations_csv;
pub mod prices_csv;

pub use operations_csv::parse_operations_csv;
pub use prices_csv::parse_prices_csv;
pub(crate) use operations_csv::parse_date;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operation kinds supported by the engine.
///
/// `Coupon`, `Dividend` and `Amortization` are income kinds: they move
/// money without changing the held quantity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Buy,
    Sell,
    Coupon,
    Dividend,
    Amortization,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Buy => "Compra",
            OperationKind::Sell => "Venta",
            OperationKind::Coupon => "Cupón",
            OperationKind::Dividend => "Dividendo",
            OperationKind::Amortization => "Amortización",
        }
    }

    /// Whether this kind pays cash without changing held quantity.
    pub fn is_income(&self) -> bool {
        matches!(
            self,
            OperationKind::Coupon | OperationKind::Dividend | OperationKind::Amortization
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold accents so "Cupón" and "cupon" compare equal.
fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            'ñ' | 'Ñ' => 'n',
            _ => c,
        })
        .collect()
}

impl FromStr for OperationKind {
    type Err = ();

    /// Substring match on the normalized description, mirroring how the
    /// source data labels rows ("Compra Mercado Secundario", "Pago de
    /// Cupón", etc.).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = fold_accents(&s.trim().to_lowercase());
        if normalized.contains("compra") || normalized == "buy" {
            Ok(OperationKind::Buy)
        } else if normalized.contains("venta") || normalized == "sell" {
            Ok(OperationKind::Sell)
        } else if normalized.contains("cupon") || normalized.contains("coupon") {
            Ok(OperationKind::Coupon)
        } else if normalized.contains("dividend") {
            Ok(OperationKind::Dividend)
        } else if normalized.contains("amortizacion") || normalized.contains("amortization") {
            Ok(OperationKind::Amortization)
        } else {
            Err(())
        }
    }
}

/// A single ledger row: one buy, sell or income event for one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub date: NaiveDate,
    pub kind: OperationKind,
    pub asset_class: Option<String>,
    pub asset: String,
    /// Always non-negative; sells are normalized at the input boundary.
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub amount: Decimal,
}

impl Operation {
    /// Quantity effect on the running position: buys add, sells subtract,
    /// income kinds leave it unchanged.
    pub fn signed_quantity(&self) -> Decimal {
        match self.kind {
            OperationKind::Buy => self.quantity,
            OperationKind::Sell => -self.quantity,
            _ => Decimal::ZERO,
        }
    }
}

/// A problem found in one input row. The row is skipped; processing
/// continues. Collected instead of failing on the first error so the
/// caller gets a best-effort table plus the full rejection list.
#[derive(Debug, Clone)]
pub struct RowIssue {
    /// Row number in the input file (1-indexed, header included).
    pub row: usize,
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl RowIssue {
    pub fn new(
        row: usize,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Count issues by field for summary reporting.
    pub fn summarize(issues: &[RowIssue]) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for issue in issues {
            *summary.entry(issue.field.clone()).or_insert(0) += 1;
        }
        summary
    }
}

/// All operations, grouped by asset, each group sorted by date with input
/// order preserved for same-date ties.
#[derive(Debug, Clone, Default)]
pub struct OperationLedger {
    by_asset: BTreeMap<String, Vec<Operation>>,
}

impl OperationLedger {
    pub fn new(operations: Vec<Operation>) -> Self {
        let mut by_asset: BTreeMap<String, Vec<Operation>> = BTreeMap::new();
        for op in operations {
            by_asset.entry(op.asset.clone()).or_default().push(op);
        }
        for ops in by_asset.values_mut() {
            // Stable sort keeps input order for same-date operations.
            ops.sort_by_key(|op| op.date);
        }
        Self { by_asset }
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.by_asset.keys().map(String::as_str)
    }

    pub fn operations_for(&self, asset: &str) -> &[Operation] {
        self.by_asset.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_asset.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_asset.values().map(Vec::len).sum()
    }

    /// Most recent asset class label seen for an asset, if any.
    pub fn asset_class_of(&self, asset: &str) -> Option<&str> {
        self.operations_for(asset)
            .iter()
            .filter_map(|op| op.asset_class.as_deref())
            .last()
    }

    /// Earliest operation date across the whole ledger.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.by_asset
            .values()
            .filter_map(|ops| ops.first().map(|op| op.date))
            .min()
    }

    /// Assets in deterministic order as an owned list.
    pub fn asset_ids(&self) -> Vec<String> {
        self.assets().map(str::to_string).collect_vec()
    }
}
