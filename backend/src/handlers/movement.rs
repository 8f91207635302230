//! HTTP handlers for inter-warehouse stock movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{
    CreateMovementInput, MovementService, StockMovement, StockMovementDetail,
};
use crate::AppState;
use shared::types::Pagination;

/// Move stock between warehouses
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<Json<StockMovementDetail>> {
    current_user.0.require_permission("inventory", "write")?;
    let service = MovementService::new(state.db);
    let movement = service
        .create_movement(current_user.0.user_id, input)
        .await?;
    Ok(Json(movement))
}

/// Reverse a stock movement
pub async fn reverse_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("inventory", "reverse")?;
    let service = MovementService::new(state.db);
    service.reverse_movement(movement_id).await?;
    Ok(Json(()))
}

/// Get a movement with its lines
pub async fn get_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<StockMovementDetail>> {
    let service = MovementService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// List movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list_movements(&pagination).await?;
    Ok(Json(movements))
}
