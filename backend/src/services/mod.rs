//! Business logic services for the Stockroom backend

pub mod batch;
pub mod catalog;
pub mod inbound;
pub mod movement;
pub mod outbound;
pub mod reconciliation;
pub mod reporting;

pub use catalog::CatalogService;
pub use inbound::InboundService;
pub use movement::MovementService;
pub use outbound::OutboundService;
pub use reconciliation::ReconciliationService;
pub use reporting::ReportingService;
