//! Valuation engine
//!
//! The reconstruction primitive shared by the composition and evolution
//! calculators, plus the epsilon tolerance used to decide zero-crossings
//! and the structured audit trace.

pub mod reconstruct;
pub mod trace;

pub use reconstruct::{held_within, reconstruct, Reconstruction};
pub use trace::{TraceEvent, TraceRecorder};

use rust_decimal::Decimal;
use std::str::FromStr;

/// Epsilon-tolerant zero comparison.
///
/// Quantities come from amount columns that were rounded when the source
/// spreadsheet computed price × quantity, so a position that was fully
/// sold can land a hair off zero. The tolerance is a parameter, not a
/// constant, so it can be tuned and tested independently of the
/// reconstruction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance(Decimal);

impl Tolerance {
    pub fn new(epsilon: Decimal) -> Self {
        Self(epsilon.abs())
    }

    pub fn epsilon(&self) -> Decimal {
        self.0
    }

    /// `|x| < ε`
    pub fn is_zero(&self, x: Decimal) -> bool {
        x.abs() < self.0
    }

    /// `x > ε`
    pub fn is_positive(&self, x: Decimal) -> bool {
        x > self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        // 1e-6 absorbs rounding in the source amounts without swallowing
        // real fractional holdings.
        Self(Decimal::new(1, 6))
    }
}

impl FromStr for Tolerance {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Tolerance::new)
    }
}
