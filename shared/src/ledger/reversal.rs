//! Reversal guard predicates
//!
//! Every ledger operation reverses at most once, and an inbound receipt
//! only reverses while all the stock it created is still on hand. The
//! services evaluate these guards inside their transactions, after the
//! relevant rows are locked.

use super::LedgerError;

/// Reject a second reversal of the same record.
pub fn guard_not_reversed(already_reversed: bool) -> Result<(), LedgerError> {
    if already_reversed {
        Err(LedgerError::AlreadyReversed)
    } else {
        Ok(())
    }
}

/// Check that all `created` units of an inbound line are still on hand.
///
/// `remaining` is the quantity summed over every batch the line created,
/// wherever that stock sits now (movements carry the origin receipt
/// forward). Fails once any unit has been sold, moved off the books or
/// written off.
pub fn guard_fully_on_hand(created: i64, remaining: i64) -> Result<(), LedgerError> {
    if remaining < created {
        Err(LedgerError::PartiallyConsumed {
            created,
            consumed: created - remaining,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reversal_passes_second_fails() {
        let mut reversed = false;

        assert!(guard_not_reversed(reversed).is_ok());
        reversed = true;

        assert_eq!(
            guard_not_reversed(reversed).unwrap_err(),
            LedgerError::AlreadyReversed
        );
    }

    #[test]
    fn test_consumed_stock_blocks_reversal() {
        assert!(guard_fully_on_hand(100, 100).is_ok());

        assert_eq!(
            guard_fully_on_hand(100, 70).unwrap_err(),
            LedgerError::PartiallyConsumed {
                created: 100,
                consumed: 30
            }
        );
    }

    #[test]
    fn test_surplus_on_hand_passes() {
        // restored or over-counted stock never blocks a reversal
        assert!(guard_fully_on_hand(100, 120).is_ok());
    }
}
