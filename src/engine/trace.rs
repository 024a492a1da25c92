//! Structured audit trace
//!
//! Reset detection, eligibility decisions, the operations a calculation
//! considered and the prices it used, recorded as typed events instead of
//! free-text logging. Off by default; tests and the `--trace` flag turn
//! it on. Reproducible: the same inputs yield the same event sequence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::OperationKind;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Running quantity crossed back to zero.
    ResetDetected {
        asset: String,
        date: NaiveDate,
        quantity_before: Decimal,
    },
    /// The active ledger chosen for a reconstruction.
    ActiveLedger {
        asset: String,
        as_of: NaiveDate,
        since: Option<NaiveDate>,
        operations: usize,
        quantity: Decimal,
    },
    /// One operation applied during a reconstruction walk.
    OperationApplied {
        asset: String,
        date: NaiveDate,
        kind: OperationKind,
        signed_quantity: Decimal,
        running_quantity: Decimal,
    },
    /// A price lookup performed by a calculator.
    PriceUsed {
        asset: String,
        date: NaiveDate,
        price: Option<Decimal>,
    },
    /// Evolution eligibility decision for an asset.
    Eligibility {
        asset: String,
        start: NaiveDate,
        end: NaiveDate,
        eligible: bool,
    },
}

/// Collects trace events when enabled; a disabled recorder is a no-op so
/// the calculators can thread one through unconditionally.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    enabled: bool,
    events: Vec<TraceEvent>,
}

impl TraceRecorder {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            events: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, event: TraceEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}
