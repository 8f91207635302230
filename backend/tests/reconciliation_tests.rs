//! Stock reconciliation (write-off) tests
//!
//! Tests for loss valuation and reversal:
//! - Losses drain batches FIFO, valued at each batch's buying cost
//! - Total loss follows the drawn batches, not the newest price
//! - Reversal refills exactly the batches that were drained

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::ledger::{allocate, available, Draw, Lot};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn lot_on_day(qty: i64, cost: &str, day: u32) -> Lot {
    Lot {
        id: Uuid::new_v4(),
        quantity: qty,
        unit_cost: dec(cost),
        arrived_at: Utc.with_ymd_and_hms(2024, 9, day, 7, 0, 0).unwrap(),
        origin_inbound_id: Uuid::new_v4(),
    }
}

/// Write off `requested` units the way create_reconciliation does:
/// allocate FIFO, drain each batch and value the loss at its buying cost.
fn write_off(
    lots: &mut [Lot],
    requested: i64,
) -> Result<(Vec<Draw>, Decimal), shared::ledger::LedgerError> {
    let draws = allocate(lots, requested)?;

    let mut total_loss = Decimal::ZERO;
    for draw in &draws {
        let lot = lots.iter_mut().find(|l| l.id == draw.lot_id).unwrap();
        lot.quantity -= draw.quantity;
        total_loss += Decimal::from(draw.quantity) * draw.unit_cost;
    }

    Ok((draws, total_loss))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A write-off crossing a batch boundary values each slice at its own
    /// batch's cost.
    #[test]
    fn test_loss_valued_per_batch_cost() {
        let mut lots = vec![lot_on_day(10, "10.00", 1), lot_on_day(10, "14.00", 2)];

        let (draws, total_loss) = write_off(&mut lots, 15).unwrap();

        assert_eq!(draws.len(), 2);
        // 10 x 10.00 + 5 x 14.00
        assert_eq!(total_loss, dec("170.00"));
        assert_eq!(available(&lots), 5);
    }

    /// A loss within the oldest batch never touches newer, pricier stock.
    #[test]
    fn test_loss_ignores_newer_prices() {
        let mut lots = vec![lot_on_day(50, "10.00", 1), lot_on_day(50, "99.00", 2)];

        let (_, total_loss) = write_off(&mut lots, 20).unwrap();

        assert_eq!(total_loss, dec("200.00"));
        assert_eq!(lots[1].quantity, 50);
    }

    /// A write-off larger than the on-hand stock is refused whole.
    #[test]
    fn test_write_off_refused_when_short() {
        let mut lots = vec![lot_on_day(5, "10.00", 1)];

        let err = write_off(&mut lots, 6).unwrap_err();
        assert!(matches!(
            err,
            shared::ledger::LedgerError::InsufficientStock { available: 5, .. }
        ));
        assert_eq!(available(&lots), 5);
    }

    /// Reversal refills the drained batches exactly.
    #[test]
    fn test_reversal_refills_drained_batches() {
        let mut lots = vec![lot_on_day(10, "10.00", 1), lot_on_day(10, "14.00", 2)];

        let (draws, _) = write_off(&mut lots, 13).unwrap();
        assert_eq!(available(&lots), 7);

        for draw in &draws {
            let lot = lots.iter_mut().find(|l| l.id == draw.lot_id).unwrap();
            lot.quantity += draw.quantity;
        }

        assert_eq!(lots[0].quantity, 10);
        assert_eq!(lots[1].quantity, 10);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Total loss equals the cost-weighted sum of the draws, and lies
    /// between the cheapest and priciest possible valuation.
    #[test]
    fn prop_loss_matches_drawn_costs(
        quantities in prop::collection::vec(1i64..100, 1..6),
        requested in 1i64..300,
    ) {
        let mut lots: Vec<Lot> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| lot_on_day(q, &format!("{}.00", 10 + i), (i + 1) as u32))
            .collect();
        let min_cost = lots.iter().map(|l| l.unit_cost).min().unwrap();
        let max_cost = lots.iter().map(|l| l.unit_cost).max().unwrap();

        if let Ok((draws, total_loss)) = write_off(&mut lots, requested) {
            let recomputed: Decimal = draws
                .iter()
                .map(|d| Decimal::from(d.quantity) * d.unit_cost)
                .sum();
            prop_assert_eq!(total_loss, recomputed);
            prop_assert!(total_loss >= Decimal::from(requested) * min_cost);
            prop_assert!(total_loss <= Decimal::from(requested) * max_cost);
        }
    }

    /// Write off then reverse restores every batch.
    #[test]
    fn prop_write_off_reverse_round_trips(
        quantities in prop::collection::vec(1i64..100, 1..6),
        requested in 1i64..300,
    ) {
        let mut lots: Vec<Lot> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| lot_on_day(q, "12.00", (i + 1) as u32))
            .collect();
        let snapshot: Vec<i64> = lots.iter().map(|l| l.quantity).collect();

        if let Ok((draws, _)) = write_off(&mut lots, requested) {
            for draw in &draws {
                let lot = lots.iter_mut().find(|l| l.id == draw.lot_id).unwrap();
                lot.quantity += draw.quantity;
            }

            let after: Vec<i64> = lots.iter().map(|l| l.quantity).collect();
            prop_assert_eq!(snapshot, after);
        }
    }
}
