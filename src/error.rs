//! Error handling for cartera
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.
//!
//! Row-level problems (a bad date in one operation, a price that cannot
//! be resolved for one asset/day) are never raised through these types
//! from a calculator call; they are collected as diagnostics on the
//! returned report. Only structural problems (a required column missing
//! from the input entirely, an inverted date range) are fatal.

use chrono::NaiveDate;
use thiserror::Error;

/// Core error types for portfolio analysis
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("missing price for {asset} on or before {date}")]
    MissingPrice { asset: String, date: NaiveDate },

    #[error("malformed operation at row {row}: {reason}")]
    MalformedOperation { row: usize, reason: String },

    #[error("required column not found: {0}")]
    MissingColumn(String),

    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for portfolio operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = PortfolioError::MissingPrice {
            asset: "AL30".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "missing price for AL30 on or before 2024-06-01");
    }

    #[test]
    fn test_malformed_operation_carries_row() {
        let err = PortfolioError::MalformedOperation {
            row: 12,
            reason: "unknown operation kind 'Canje'".to_string(),
        };
        assert!(err.to_string().contains("row 12"));
        assert!(err.to_string().contains("Canje"));
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to load operations");
        match result {
            Err(e) => {
                assert!(e.to_string().contains("failed to load operations"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
