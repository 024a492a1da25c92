//! Holding reconstruction
//!
//! Replays an asset's chronological operation history, detects resets to
//! zero (full liquidation followed by re-accumulation) and derives the
//! active ledger: the operations strictly after the last reset at or
//! before the reference date. Invested/sales/income accounting always
//! runs over the active ledger, never the full history.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::trace::{TraceEvent, TraceRecorder};
use super::Tolerance;
use crate::ledger::Operation;

/// Result of replaying one asset's history up to a date.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Date of the last reset at or before `as_of`, `None` while still in
    /// the first accumulation cycle.
    pub last_reset: Option<NaiveDate>,
    /// Operations strictly after `last_reset` (all of them when `None`),
    /// up to and including `as_of`.
    pub active_ops: Vec<Operation>,
    /// Net signed quantity over `active_ops`.
    pub quantity_as_of: Decimal,
}

impl Reconstruction {
    /// Sum of buy amounts in the active ledger.
    pub fn invested(&self) -> Decimal {
        self.active_ops
            .iter()
            .filter(|op| op.kind == crate::ledger::OperationKind::Buy)
            .map(|op| op.amount)
            .sum()
    }

    /// Sum of sell amounts in the active ledger.
    pub fn sales(&self) -> Decimal {
        self.active_ops
            .iter()
            .filter(|op| op.kind == crate::ledger::OperationKind::Sell)
            .map(|op| op.amount)
            .sum()
    }

    /// Sum of coupon/dividend/amortization amounts in the active ledger.
    pub fn income(&self) -> Decimal {
        self.active_ops
            .iter()
            .filter(|op| op.kind.is_income())
            .map(|op| op.amount)
            .sum()
    }
}

/// Replay `ops` (one asset, date-sorted, ties in input order) up to
/// `as_of`.
///
/// A reset is recorded whenever the running quantity goes from positive
/// to zero-or-below within tolerance; the running quantity is clamped to
/// zero afterwards, so an oversell closes the cycle instead of going
/// negative forever. An oversell at the very start of a cycle (sell with
/// nothing held) leaves the quantity negative; the calculators report
/// that as a diagnostic, never a panic.
pub fn reconstruct(
    asset: &str,
    ops: &[Operation],
    as_of: NaiveDate,
    tolerance: Tolerance,
    trace: &mut TraceRecorder,
) -> Reconstruction {
    let mut running = Decimal::ZERO;
    let mut last_reset: Option<NaiveDate> = None;

    for op in ops.iter().filter(|op| op.date <= as_of) {
        let previous = running;
        running += op.signed_quantity();

        trace.record(TraceEvent::OperationApplied {
            asset: asset.to_string(),
            date: op.date,
            kind: op.kind,
            signed_quantity: op.signed_quantity(),
            running_quantity: running,
        });

        if tolerance.is_positive(previous) && !tolerance.is_positive(running) {
            trace.record(TraceEvent::ResetDetected {
                asset: asset.to_string(),
                date: op.date,
                quantity_before: previous,
            });
            last_reset = Some(op.date);
            running = Decimal::ZERO;
        }
    }

    let active_ops: Vec<Operation> = ops
        .iter()
        .filter(|op| op.date <= as_of)
        .filter(|op| last_reset.is_none_or(|reset| op.date > reset))
        .cloned()
        .collect();

    let quantity_as_of: Decimal = active_ops.iter().map(Operation::signed_quantity).sum();

    trace.record(TraceEvent::ActiveLedger {
        asset: asset.to_string(),
        as_of,
        since: last_reset,
        operations: active_ops.len(),
        quantity: quantity_as_of,
    });

    Reconstruction {
        last_reset,
        active_ops,
        quantity_as_of,
    }
}

/// Whether the asset held a positive quantity at any point within
/// `[start, end]`, the evolution eligibility test. Scans the checkpoint
/// sequence, not just the boundary snapshots, so a position opened and
/// fully closed inside the window still qualifies. Monotone in window
/// size: widening the window never drops an eligible asset.
pub fn held_within(
    ops: &[Operation],
    start: NaiveDate,
    end: NaiveDate,
    tolerance: Tolerance,
) -> bool {
    let mut running = Decimal::ZERO;

    for op in ops.iter().filter(|op| op.date <= end) {
        let previous = running;
        running += op.signed_quantity();
        if tolerance.is_positive(previous) && !tolerance.is_positive(running) {
            running = Decimal::ZERO;
        }

        // Positive after an in-window operation
        if op.date >= start && tolerance.is_positive(running) {
            return true;
        }
    }

    // No in-window operation left a position; held iff positive at `start`
    let mut at_start = Decimal::ZERO;
    for op in ops.iter().filter(|op| op.date <= start) {
        let previous = at_start;
        at_start += op.signed_quantity();
        if tolerance.is_positive(previous) && !tolerance.is_positive(at_start) {
            at_start = Decimal::ZERO;
        }
    }
    tolerance.is_positive(at_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::OperationKind;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn op(date: NaiveDate, kind: OperationKind, qty: Decimal, amount: Decimal) -> Operation {
        Operation {
            date,
            kind,
            asset_class: None,
            asset: "AL30".to_string(),
            quantity: qty,
            price: None,
            amount,
        }
    }

    fn buy_sell_rebuy() -> Vec<Operation> {
        vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(1000), dec!(95500)),
            op(ymd(2024, 3, 1), OperationKind::Sell, dec!(1000), dec!(100000)),
            op(ymd(2024, 5, 1), OperationKind::Buy, dec!(500), dec!(45000)),
        ]
    }

    fn run(ops: &[Operation], as_of: NaiveDate) -> Reconstruction {
        reconstruct(
            "AL30",
            ops,
            as_of,
            Tolerance::default(),
            &mut TraceRecorder::disabled(),
        )
    }

    #[test]
    fn test_reset_and_reaccumulation() {
        let ops = buy_sell_rebuy();
        let rec = run(&ops, ymd(2024, 6, 1));

        assert_eq!(rec.last_reset, Some(ymd(2024, 3, 1)));
        assert_eq!(rec.active_ops.len(), 1);
        assert_eq!(rec.quantity_as_of, dec!(500));
        assert_eq!(rec.invested(), dec!(45000));
        assert_eq!(rec.sales(), Decimal::ZERO);
        assert_eq!(rec.income(), Decimal::ZERO);
    }

    #[test]
    fn test_never_crosses_zero_keeps_entire_history() {
        let ops = vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(1000), dec!(95500)),
            op(ymd(2024, 2, 1), OperationKind::Sell, dec!(400), dec!(40000)),
            op(ymd(2024, 4, 1), OperationKind::Coupon, Decimal::ZERO, dec!(3500)),
        ];
        let rec = run(&ops, ymd(2024, 6, 1));

        assert_eq!(rec.last_reset, None);
        assert_eq!(rec.active_ops.len(), 3);
        assert_eq!(rec.quantity_as_of, dec!(600));
        assert_eq!(rec.sales(), dec!(40000));
        assert_eq!(rec.income(), dec!(3500));
    }

    #[test]
    fn test_as_of_before_reset_sees_first_cycle() {
        let ops = buy_sell_rebuy();
        let rec = run(&ops, ymd(2024, 2, 1));

        assert_eq!(rec.last_reset, None);
        assert_eq!(rec.quantity_as_of, dec!(1000));
        assert_eq!(rec.invested(), dec!(95500));
    }

    #[test]
    fn test_as_of_on_reset_date_yields_empty_active_ledger() {
        let ops = buy_sell_rebuy();
        let rec = run(&ops, ymd(2024, 3, 1));

        assert_eq!(rec.last_reset, Some(ymd(2024, 3, 1)));
        assert!(rec.active_ops.is_empty());
        assert_eq!(rec.quantity_as_of, Decimal::ZERO);
    }

    #[test]
    fn test_income_does_not_move_quantity_or_trigger_reset() {
        let ops = vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(100), dec!(1000)),
            op(ymd(2024, 2, 1), OperationKind::Dividend, Decimal::ZERO, dec!(50)),
            op(ymd(2024, 3, 1), OperationKind::Amortization, Decimal::ZERO, dec!(70)),
        ];
        let rec = run(&ops, ymd(2024, 6, 1));
        assert_eq!(rec.last_reset, None);
        assert_eq!(rec.quantity_as_of, dec!(100));
        assert_eq!(rec.income(), dec!(120));
    }

    #[test]
    fn test_oversell_closes_cycle_and_clamps_to_zero() {
        let ops = vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(100), dec!(1000)),
            op(ymd(2024, 2, 1), OperationKind::Sell, dec!(150), dec!(1500)),
            op(ymd(2024, 3, 1), OperationKind::Buy, dec!(30), dec!(300)),
        ];
        let rec = run(&ops, ymd(2024, 6, 1));
        // Overselling past zero is a reset, not a negative carry
        assert_eq!(rec.last_reset, Some(ymd(2024, 2, 1)));
        assert_eq!(rec.quantity_as_of, dec!(30));
    }

    #[test]
    fn test_sell_with_nothing_held_goes_negative_without_panic() {
        let ops = vec![op(
            ymd(2024, 1, 10),
            OperationKind::Sell,
            dec!(10),
            dec!(100),
        )];
        let rec = run(&ops, ymd(2024, 6, 1));
        assert_eq!(rec.last_reset, None);
        assert_eq!(rec.quantity_as_of, dec!(-10));
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let ops = buy_sell_rebuy();
        let first = run(&ops, ymd(2024, 6, 1));
        let second = run(&ops, ymd(2024, 6, 1));
        assert_eq!(first.last_reset, second.last_reset);
        assert_eq!(first.active_ops, second.active_ops);
        assert_eq!(first.quantity_as_of, second.quantity_as_of);
    }

    #[test]
    fn test_fractional_residue_within_tolerance_still_resets() {
        let tol = Tolerance::new(dec!(0.001));
        let ops = vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(100.0004), dec!(1000)),
            op(ymd(2024, 2, 1), OperationKind::Sell, dec!(100), dec!(1000)),
        ];
        let rec = reconstruct(
            "AL30",
            &ops,
            ymd(2024, 6, 1),
            tol,
            &mut TraceRecorder::disabled(),
        );
        assert_eq!(rec.last_reset, Some(ymd(2024, 2, 1)));
        assert_eq!(rec.quantity_as_of, Decimal::ZERO);
    }

    #[test]
    fn test_trace_records_reset_and_active_ledger() {
        let ops = buy_sell_rebuy();
        let mut trace = TraceRecorder::enabled();
        reconstruct("AL30", &ops, ymd(2024, 6, 1), Tolerance::default(), &mut trace);

        let resets: Vec<_> = trace
            .events()
            .iter()
            .filter(|e| matches!(e, TraceEvent::ResetDetected { .. }))
            .collect();
        assert_eq!(resets.len(), 1);
        assert!(matches!(
            trace.events().last(),
            Some(TraceEvent::ActiveLedger { operations: 1, .. })
        ));
    }

    #[test]
    fn test_held_within_boundary_only_position() {
        // Held before the window, sold inside it
        let ops = vec![
            op(ymd(2024, 1, 10), OperationKind::Buy, dec!(100), dec!(1000)),
            op(ymd(2024, 3, 1), OperationKind::Sell, dec!(100), dec!(1100)),
        ];
        let tol = Tolerance::default();
        assert!(held_within(&ops, ymd(2024, 2, 1), ymd(2024, 6, 1), tol));
        // Window entirely after the liquidation
        assert!(!held_within(&ops, ymd(2024, 4, 1), ymd(2024, 6, 1), tol));
    }

    #[test]
    fn test_held_within_position_opened_and_closed_inside_window() {
        let ops = vec![
            op(ymd(2024, 3, 10), OperationKind::Buy, dec!(100), dec!(1000)),
            op(ymd(2024, 3, 20), OperationKind::Sell, dec!(100), dec!(1100)),
        ];
        let tol = Tolerance::default();
        // Not held at either endpoint, but held inside
        assert!(held_within(&ops, ymd(2024, 3, 1), ymd(2024, 4, 1), tol));
        assert!(!held_within(&ops, ymd(2024, 1, 1), ymd(2024, 3, 5), tol));
    }

    #[test]
    fn test_held_within_is_monotone_in_window_size() {
        let ops = buy_sell_rebuy();
        let tol = Tolerance::default();
        let narrow = (ymd(2024, 2, 1), ymd(2024, 2, 15));
        let wide = (ymd(2024, 1, 1), ymd(2024, 6, 1));
        assert!(held_within(&ops, narrow.0, narrow.1, tol));
        assert!(held_within(&ops, wide.0, wide.1, tol));
    }
}
