//! FIFO batch allocation
//!
//! Given the batches on hand for one (product, warehouse) pair, plan how a
//! requested quantity is drawn from them: oldest arrival first, ties broken
//! by creation order. Availability is checked against the total before any
//! draw is produced, so a failed allocation never leaves a partial plan.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::LedgerError;

/// A batch as seen by the allocator: the remaining stock of one inbound
/// line (or one moved slice of it) in a single warehouse.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub arrived_at: DateTime<Utc>,
    /// Receipt that originally brought this stock in. Carried forward
    /// unchanged when stock moves between warehouses.
    pub origin_inbound_id: Uuid,
}

/// One slice of an allocation: `quantity` units taken from batch `lot_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub lot_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub arrived_at: DateTime<Utc>,
    pub origin_inbound_id: Uuid,
}

/// Total quantity available across the given lots.
pub fn available(lots: &[Lot]) -> i64 {
    lots.iter().map(|l| l.quantity).sum()
}

/// Plan a FIFO allocation of `requested` units across `lots`.
///
/// Lots are ordered by arrival time ascending; lots sharing an arrival
/// time keep their slice order (the caller supplies them in creation
/// order). Zero-quantity lots are skipped but never removed. Fails with
/// [`LedgerError::InsufficientStock`] before producing any draw when the
/// combined quantity falls short.
pub fn allocate(lots: &[Lot], requested: i64) -> Result<Vec<Draw>, LedgerError> {
    if requested <= 0 {
        return Err(LedgerError::InvalidQuantity(requested));
    }

    let total = available(lots);
    if total < requested {
        return Err(LedgerError::InsufficientStock {
            requested,
            available: total,
        });
    }

    // Stable sort keeps creation order for same-day arrivals.
    let mut ordered: Vec<&Lot> = lots.iter().collect();
    ordered.sort_by_key(|l| l.arrived_at);

    let mut remaining = requested;
    let mut draws = Vec::new();
    for lot in ordered {
        if remaining == 0 {
            break;
        }
        if lot.quantity == 0 {
            continue;
        }
        let take = lot.quantity.min(remaining);
        remaining -= take;
        draws.push(Draw {
            lot_id: lot.id,
            quantity: take,
            unit_cost: lot.unit_cost,
            arrived_at: lot.arrived_at,
            origin_inbound_id: lot.origin_inbound_id,
        });
    }

    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lot(qty: i64, day: u32) -> Lot {
        Lot {
            id: Uuid::new_v4(),
            quantity: qty,
            unit_cost: Decimal::from(100),
            arrived_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            origin_inbound_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_takes_oldest_first() {
        let lots = vec![lot(10, 3), lot(10, 1), lot(10, 2)];
        let draws = allocate(&lots, 15).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].lot_id, lots[1].id);
        assert_eq!(draws[0].quantity, 10);
        assert_eq!(draws[1].lot_id, lots[2].id);
        assert_eq!(draws[1].quantity, 5);
    }

    #[test]
    fn test_boundary_crosses_exactly_one_unit() {
        // q1 + 1 must empty batch 1, take 1 from batch 2, leave batch 3 alone
        let lots = vec![lot(4, 1), lot(7, 2), lot(9, 3)];
        let draws = allocate(&lots, 5).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].quantity, 4);
        assert_eq!(draws[1].quantity, 1);
    }

    #[test]
    fn test_same_day_ties_keep_creation_order() {
        let lots = vec![lot(5, 1), lot(5, 1)];
        let draws = allocate(&lots, 6).unwrap();

        assert_eq!(draws[0].lot_id, lots[0].id);
        assert_eq!(draws[0].quantity, 5);
        assert_eq!(draws[1].lot_id, lots[1].id);
        assert_eq!(draws[1].quantity, 1);
    }

    #[test]
    fn test_zero_quantity_lots_skipped() {
        let lots = vec![lot(0, 1), lot(8, 2)];
        let draws = allocate(&lots, 3).unwrap();

        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].lot_id, lots[1].id);
    }

    #[test]
    fn test_insufficient_stock_before_any_draw() {
        let lots = vec![lot(3, 1), lot(4, 2)];
        let err = allocate(&lots, 8).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                requested: 8,
                available: 7
            }
        );
    }

    #[test]
    fn test_rejects_non_positive_request() {
        let lots = vec![lot(3, 1)];
        assert_eq!(allocate(&lots, 0).unwrap_err(), LedgerError::InvalidQuantity(0));
        assert_eq!(
            allocate(&lots, -2).unwrap_err(),
            LedgerError::InvalidQuantity(-2)
        );
    }

    #[test]
    fn test_draws_conserve_requested_quantity() {
        let lots = vec![lot(2, 1), lot(2, 2), lot(2, 3), lot(2, 4)];
        let draws = allocate(&lots, 7).unwrap();

        let taken: i64 = draws.iter().map(|d| d.quantity).sum();
        assert_eq!(taken, 7);
    }
}
