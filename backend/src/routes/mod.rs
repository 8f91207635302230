//! Route definitions for the Stockroom warehouse backend

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. The state is needed up front so the auth
/// middleware can read the JWT secret from config.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - catalog
        .nest("/categories", category_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/warehouses", warehouse_routes(state.clone()))
        // Protected routes - stock ledger
        .nest("/inbound", inbound_routes(state.clone()))
        .nest("/outbound", outbound_routes(state.clone()))
        .nest("/movements", movement_routes(state.clone()))
        .nest("/reconciliations", reconciliation_routes(state.clone()))
        // Protected routes - reporting
        .nest("/reports", report_routes(state))
}

/// Category routes (protected)
fn category_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::deactivate_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Warehouse routes (protected)
fn warehouse_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_warehouses).post(handlers::create_warehouse),
        )
        .route(
            "/:warehouse_id",
            get(handlers::get_warehouse).delete(handlers::deactivate_warehouse),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inbound receipt routes (protected)
fn inbound_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inbound).post(handlers::create_inbound),
        )
        .route("/:receipt_id", get(handlers::get_inbound))
        .route("/:receipt_id/reverse", post(handlers::reverse_inbound))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Outbound shipment routes (protected)
fn outbound_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_outbound).post(handlers::create_outbound),
        )
        .route("/:shipment_id", get(handlers::get_outbound))
        .route("/:shipment_id/reverse", post(handlers::reverse_outbound))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock movement routes (protected)
fn movement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        .route("/:movement_id", get(handlers::get_movement))
        .route("/:movement_id/reverse", post(handlers::reverse_movement))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stock reconciliation routes (protected)
fn reconciliation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_reconciliations).post(handlers::create_reconciliation),
        )
        .route("/:reconciliation_id", get(handlers::get_reconciliation))
        .route(
            "/:reconciliation_id/reverse",
            post(handlers::reverse_reconciliation),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Reporting routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/daily-sales", get(handlers::get_daily_sales))
        .route("/stock-on-hand", get(handlers::get_stock_on_hand))
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/valuation", get(handlers::get_valuation))
        .route("/losses", get(handlers::get_loss_summary))
        .route("/outbound-export", get(handlers::export_outbound))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
