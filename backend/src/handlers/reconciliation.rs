//! HTTP handlers for stock reconciliation (write-off) endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reconciliation::{
    CreateReconciliationInput, ReconciliationService, StockReconciliation,
    StockReconciliationDetail,
};
use crate::AppState;
use shared::types::Pagination;

/// Write off stock as loss
pub async fn create_reconciliation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateReconciliationInput>,
) -> AppResult<Json<StockReconciliationDetail>> {
    current_user.0.require_permission("inventory", "write")?;
    let service = ReconciliationService::new(state.db);
    let reconciliation = service
        .create_reconciliation(current_user.0.user_id, input)
        .await?;
    Ok(Json(reconciliation))
}

/// Reverse a reconciliation
pub async fn reverse_reconciliation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(reconciliation_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("inventory", "reverse")?;
    let service = ReconciliationService::new(state.db);
    service.reverse_reconciliation(reconciliation_id).await?;
    Ok(Json(()))
}

/// Get a reconciliation with its lines
pub async fn get_reconciliation(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(reconciliation_id): Path<Uuid>,
) -> AppResult<Json<StockReconciliationDetail>> {
    let service = ReconciliationService::new(state.db);
    let reconciliation = service.get_reconciliation(reconciliation_id).await?;
    Ok(Json(reconciliation))
}

/// List reconciliations, newest first
pub async fn list_reconciliations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockReconciliation>>> {
    let service = ReconciliationService::new(state.db);
    let reconciliations = service.list_reconciliations(&pagination).await?;
    Ok(Json(reconciliations))
}
