//! Outbound shipment tests
//!
//! Tests for sub-line expansion and discount arithmetic:
//! - One sub-line per batch drawn, carrying that batch's buying cost
//! - Discounts validated against the whole line, anchored on the last sub-line
//! - Reversal restores every drawn batch exactly

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::ledger::{
    allocate, apply_to_last, available, discount_amount, guard_not_reversed, validate_discount,
    DiscountKind, LedgerError, Lot,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn lot_on_day(qty: i64, cost: &str, day: u32) -> Lot {
    Lot {
        id: Uuid::new_v4(),
        quantity: qty,
        unit_cost: dec(cost),
        arrived_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
        origin_inbound_id: Uuid::new_v4(),
    }
}

/// A staged sub-line as the shipment service builds it
struct SubLine {
    source_batch_id: Uuid,
    quantity: i64,
    unit_cost: Decimal,
    subtotal: Decimal,
}

/// Expand one requested line into sub-lines the way create_outbound does:
/// allocate FIFO, price every unit at the selling price, validate the
/// discount against the whole line and subtract it from the last sub-line.
fn expand_line(
    lots: &[Lot],
    quantity: i64,
    selling_price: Decimal,
    kind: DiscountKind,
    value: Decimal,
) -> Result<(Vec<SubLine>, Decimal), LedgerError> {
    let draws = allocate(lots, quantity)?;

    let mut subtotals: Vec<Decimal> = draws
        .iter()
        .map(|d| Decimal::from(d.quantity) * selling_price)
        .collect();
    let line_subtotal: Decimal = subtotals.iter().copied().sum();

    validate_discount(kind, value, line_subtotal)?;
    let discount = discount_amount(kind, value, line_subtotal);
    apply_to_last(&mut subtotals, discount);

    let sub_lines = draws
        .iter()
        .zip(&subtotals)
        .map(|(d, s)| SubLine {
            source_batch_id: d.lot_id,
            quantity: d.quantity,
            unit_cost: d.unit_cost,
            subtotal: *s,
        })
        .collect();

    Ok((sub_lines, line_subtotal - discount))
}

/// Undo the sub-lines against the lots, as reverse_outbound does
fn restore(lots: &mut [Lot], sub_lines: &[SubLine]) {
    for sub in sub_lines {
        let lot = lots
            .iter_mut()
            .find(|l| l.id == sub.source_batch_id)
            .unwrap();
        lot.quantity += sub.quantity;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A line crossing a batch boundary splits into one sub-line per batch,
    /// each carrying that batch's buying cost.
    #[test]
    fn test_line_splits_per_batch_with_batch_cost() {
        let lots = vec![lot_on_day(30, "10.00", 1), lot_on_day(40, "13.00", 2)];

        let (subs, total) =
            expand_line(&lots, 50, dec("25.00"), DiscountKind::None, dec("0")).unwrap();

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].quantity, 30);
        assert_eq!(subs[0].unit_cost, dec("10.00"));
        assert_eq!(subs[0].subtotal, dec("750.00"));
        assert_eq!(subs[1].quantity, 20);
        assert_eq!(subs[1].unit_cost, dec("13.00"));
        assert_eq!(subs[1].subtotal, dec("500.00"));
        assert_eq!(total, dec("1250.00"));
    }

    /// A percent discount is computed on the whole line, not per sub-line.
    #[test]
    fn test_percent_discount_computed_on_whole_line() {
        let lots = vec![lot_on_day(10, "10.00", 1), lot_on_day(10, "11.00", 2)];

        // 20 units at 50 = 1000, 10% off = 100
        let (subs, total) =
            expand_line(&lots, 20, dec("50.00"), DiscountKind::Percent, dec("10")).unwrap();

        assert_eq!(total, dec("900.00"));
        assert_eq!(subs[0].subtotal, dec("500.00"));
        assert_eq!(subs[1].subtotal, dec("400.00"));
    }

    /// An amount discount larger than the last sub-line drives it negative
    /// while the line total stays correct.
    #[test]
    fn test_amount_discount_can_push_last_subline_negative() {
        let lots = vec![lot_on_day(9, "10.00", 1), lot_on_day(1, "11.00", 2)];

        // 10 units at 100 = 1000; last sub-line is only 100
        let (subs, total) =
            expand_line(&lots, 10, dec("100.00"), DiscountKind::Amount, dec("250")).unwrap();

        assert_eq!(total, dec("750.00"));
        assert_eq!(subs[0].subtotal, dec("900.00"));
        assert_eq!(subs[1].subtotal, dec("-150.00"));
    }

    /// Percent above 99 and amount at or above the line subtotal are refused.
    #[test]
    fn test_discount_bounds_refused() {
        let lots = vec![lot_on_day(10, "10.00", 1)];

        let err = expand_line(&lots, 10, dec("50.00"), DiscountKind::Percent, dec("100"));
        assert!(matches!(err, Err(LedgerError::InvalidDiscount(_))));

        // line subtotal is 500
        let err = expand_line(&lots, 10, dec("50.00"), DiscountKind::Amount, dec("500"));
        assert!(matches!(err, Err(LedgerError::InvalidDiscount(_))));
    }

    /// A rejected discount must leave the lots untouched; the service only
    /// consumes draws after validation passes.
    #[test]
    fn test_failed_line_consumes_nothing() {
        let lots = vec![lot_on_day(10, "10.00", 1)];
        let before = available(&lots);

        let result = expand_line(&lots, 10, dec("50.00"), DiscountKind::Percent, dec("150"));
        assert!(result.is_err());
        assert_eq!(available(&lots), before);
    }

    /// Selling 4 of a 10-unit batch at 150 with a 50 amount discount:
    /// one sub-line, subtotal 550, batch left at 6.
    #[test]
    fn test_discounted_sale_within_one_batch() {
        let mut lots = vec![lot_on_day(10, "100.00", 1)];

        let (subs, total) =
            expand_line(&lots, 4, dec("150.00"), DiscountKind::Amount, dec("50")).unwrap();

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].quantity, 4);
        assert_eq!(subs[0].unit_cost, dec("100.00"));
        assert_eq!(subs[0].subtotal, dec("550.00"));
        assert_eq!(total, dec("550.00"));

        let lot = lots
            .iter_mut()
            .find(|l| l.id == subs[0].source_batch_id)
            .unwrap();
        lot.quantity -= subs[0].quantity;
        assert_eq!(available(&lots), 6);
    }

    /// A shipment reverses once; the flag flips and a second attempt is
    /// rejected before any batch is touched again.
    #[test]
    fn test_second_reversal_is_rejected() {
        let mut reversed = false;

        // first reversal: guard passes, flag flips
        assert!(guard_not_reversed(reversed).is_ok());
        reversed = true;

        // second reversal: guard fires, stock must stay untouched
        assert_eq!(
            guard_not_reversed(reversed).unwrap_err(),
            LedgerError::AlreadyReversed
        );
    }

    /// Reversal puts each drawn quantity back on its source batch.
    #[test]
    fn test_reversal_restores_source_batches() {
        let mut lots = vec![lot_on_day(30, "10.00", 1), lot_on_day(40, "13.00", 2)];

        let (subs, _) =
            expand_line(&lots, 45, dec("20.00"), DiscountKind::None, dec("0")).unwrap();
        for sub in &subs {
            let lot = lots
                .iter_mut()
                .find(|l| l.id == sub.source_batch_id)
                .unwrap();
            lot.quantity -= sub.quantity;
        }
        assert_eq!(available(&lots), 25);

        restore(&mut lots, &subs);
        assert_eq!(available(&lots), 70);
        assert_eq!(lots[0].quantity, 30);
        assert_eq!(lots[1].quantity, 40);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn discount_strategy() -> impl Strategy<Value = (DiscountKind, Decimal)> {
    prop_oneof![
        Just((DiscountKind::None, Decimal::ZERO)),
        (0u32..=99).prop_map(|p| (DiscountKind::Percent, Decimal::from(p))),
        (0u32..200).prop_map(|a| (DiscountKind::Amount, Decimal::from(a))),
    ]
}

proptest! {
    /// The line total always equals the sum of its sub-line subtotals.
    #[test]
    fn prop_total_equals_subline_sum(
        quantities in prop::collection::vec(1i64..80, 1..6),
        requested in 1i64..200,
        price in 1u32..500,
        (kind, value) in discount_strategy(),
    ) {
        let lots: Vec<Lot> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| lot_on_day(q, "15.00", (i + 1) as u32))
            .collect();

        if let Ok((subs, total)) =
            expand_line(&lots, requested, Decimal::from(price), kind, value)
        {
            let sum: Decimal = subs.iter().map(|s| s.subtotal).sum();
            prop_assert_eq!(sum, total);
        }
    }

    /// Every sub-line except the last carries its undiscounted subtotal.
    #[test]
    fn prop_only_last_subline_discounted(
        quantities in prop::collection::vec(1i64..80, 2..6),
        price in 1u32..500,
        (kind, value) in discount_strategy(),
    ) {
        let lots: Vec<Lot> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| lot_on_day(q, "15.00", (i + 1) as u32))
            .collect();
        let requested: i64 = quantities.iter().sum();

        if let Ok((subs, _)) =
            expand_line(&lots, requested, Decimal::from(price), kind, value)
        {
            for sub in &subs[..subs.len() - 1] {
                prop_assert_eq!(
                    sub.subtotal,
                    Decimal::from(sub.quantity) * Decimal::from(price)
                );
            }
        }
    }

    /// Ship then reverse is a no-op on stock levels.
    #[test]
    fn prop_ship_reverse_round_trips_stock(
        quantities in prop::collection::vec(1i64..80, 1..6),
        requested in 1i64..200,
    ) {
        let mut lots: Vec<Lot> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| lot_on_day(q, "15.00", (i + 1) as u32))
            .collect();
        let snapshot: Vec<i64> = lots.iter().map(|l| l.quantity).collect();

        if let Ok((subs, _)) =
            expand_line(&lots, requested, dec("20.00"), DiscountKind::None, dec("0"))
        {
            for sub in &subs {
                let lot = lots.iter_mut().find(|l| l.id == sub.source_batch_id).unwrap();
                lot.quantity -= sub.quantity;
            }
            restore(&mut lots, &subs);

            let after: Vec<i64> = lots.iter().map(|l| l.quantity).collect();
            prop_assert_eq!(snapshot, after);
        }
    }
}
