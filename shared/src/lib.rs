//! Shared domain logic for the Stockroom warehouse management system
//!
//! This crate contains the pure inventory ledger engine (FIFO batch
//! allocation, discount arithmetic, receipt line merging) together with
//! the validation helpers used by the backend. Nothing in here performs
//! I/O, which keeps the ledger invariants testable in isolation.

pub mod ledger;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use types::*;
pub use validation::*;
