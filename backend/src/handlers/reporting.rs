//! HTTP handlers for reporting and export endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{
    DailySalesPoint, LossSummary, ReportFilter, ReportingService, StockOnHand, WarehouseValuation,
};
use crate::AppState;

fn reporting_service(state: &AppState) -> ReportingService {
    ReportingService::new(
        state.db.clone(),
        state.config.reporting.timezone_offset_minutes,
    )
}

/// Daily sales totals for the trend chart
pub async fn get_daily_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Vec<DailySalesPoint>>> {
    let service = reporting_service(&state);
    let points = service.get_daily_sales(&filter).await?;
    Ok(Json(points))
}

/// On-hand quantity per product
pub async fn get_stock_on_hand(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Vec<StockOnHand>>> {
    let service = reporting_service(&state);
    let rows = service.get_stock_on_hand(filter.warehouse_id).await?;
    Ok(Json(rows))
}

/// Products at or below the configured low-stock threshold
pub async fn get_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockOnHand>>> {
    let threshold = state.config.reporting.low_stock_threshold;
    let service = reporting_service(&state);
    let rows = service.get_low_stock(threshold).await?;
    Ok(Json(rows))
}

/// Stock value per warehouse at buying cost
pub async fn get_valuation(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<WarehouseValuation>>> {
    let service = reporting_service(&state);
    let rows = service.get_valuation().await?;
    Ok(Json(rows))
}

/// Write-off loss summary
pub async fn get_loss_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<LossSummary>> {
    let service = reporting_service(&state);
    let summary = service.get_loss_summary(&filter).await?;
    Ok(Json(summary))
}

/// Download outbound history as CSV
pub async fn export_outbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<impl IntoResponse> {
    let service = reporting_service(&state);
    let csv = service.export_outbound_csv(&filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"outbound_history.csv\"",
            ),
        ],
        csv,
    ))
}
