//! HTTP handlers for inbound receipt endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inbound::{
    CreateInboundInput, InboundReceipt, InboundReceiptDetail, InboundService,
};
use crate::AppState;
use shared::types::Pagination;

/// Record a supplier delivery
pub async fn create_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInboundInput>,
) -> AppResult<Json<InboundReceiptDetail>> {
    current_user.0.require_permission("inventory", "write")?;
    let service = InboundService::new(state.db);
    let receipt = service.create_inbound(current_user.0.user_id, input).await?;
    Ok(Json(receipt))
}

/// Reverse an inbound receipt
pub async fn reverse_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(receipt_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("inventory", "reverse")?;
    let service = InboundService::new(state.db);
    service.reverse_inbound(receipt_id).await?;
    Ok(Json(()))
}

/// Get a receipt with its lines
pub async fn get_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(receipt_id): Path<Uuid>,
) -> AppResult<Json<InboundReceiptDetail>> {
    let service = InboundService::new(state.db);
    let receipt = service.get_inbound(receipt_id).await?;
    Ok(Json(receipt))
}

/// List receipts, newest first
pub async fn list_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<InboundReceipt>>> {
    let service = InboundService::new(state.db);
    let receipts = service.list_inbound(&pagination).await?;
    Ok(Json(receipts))
}
