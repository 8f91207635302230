//! Inventory ledger engine
//!
//! The ledger tracks stock as batches: one batch per (product, warehouse,
//! unit cost, arrival) created by an inbound receipt. Outbound shipments,
//! stock movements and reconciliations consume batches oldest-first, and
//! every consuming operation records which batches it drew from so it can
//! be reversed later.

pub mod allocation;
pub mod discount;
pub mod receipt;
pub mod reversal;

pub use allocation::{allocate, available, Draw, Lot};
pub use discount::{apply_to_last, discount_amount, validate_discount, DiscountKind};
pub use receipt::{merge_lines, receipt_total, MergedLine, ReceiptLine};
pub use reversal::{guard_fully_on_hand, guard_not_reversed};

use thiserror::Error;

/// Errors produced by the pure ledger engine.
///
/// The backend maps these into its API error taxonomy, attaching the
/// product and warehouse context the engine does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("already reversed")]
    AlreadyReversed,

    #[error("{consumed} of {created} units already consumed downstream")]
    PartiallyConsumed { created: i64, consumed: i64 },
}
