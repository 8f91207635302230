//! HTTP request handlers for the Stockroom backend

pub mod catalog;
pub mod health;
pub mod inbound;
pub mod movement;
pub mod outbound;
pub mod reconciliation;
pub mod reporting;

pub use catalog::*;
pub use health::*;
pub use inbound::*;
pub use movement::*;
pub use outbound::*;
pub use reconciliation::*;
pub use reporting::*;
