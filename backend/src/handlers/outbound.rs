//! HTTP handlers for outbound shipment endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::outbound::{
    CreateOutboundInput, OutboundService, OutboundShipment, OutboundShipmentDetail,
};
use crate::AppState;
use shared::types::Pagination;

/// Create an outbound shipment, consuming stock FIFO
pub async fn create_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOutboundInput>,
) -> AppResult<Json<OutboundShipmentDetail>> {
    current_user.0.require_permission("inventory", "write")?;
    let service = OutboundService::new(state.db);
    let shipment = service
        .create_outbound(current_user.0.user_id, input)
        .await?;
    Ok(Json(shipment))
}

/// Reverse an outbound shipment
pub async fn reverse_outbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("inventory", "reverse")?;
    let service = OutboundService::new(state.db);
    service.reverse_outbound(shipment_id).await?;
    Ok(Json(()))
}

/// Get a shipment with its sub-lines
pub async fn get_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<OutboundShipmentDetail>> {
    let service = OutboundService::new(state.db);
    let shipment = service.get_outbound(shipment_id).await?;
    Ok(Json(shipment))
}

/// List shipments, newest first
pub async fn list_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<OutboundShipment>>> {
    let service = OutboundService::new(state.db);
    let shipments = service.list_outbound(&pagination).await?;
    Ok(Json(shipments))
}
