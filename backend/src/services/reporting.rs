//! Reporting service for dashboards and data export
//!
//! Read-only aggregates over the ledger. Reversed records never count
//! toward financial totals; they only appear when history is listed
//! explicitly. Sales are bucketed into calendar days using the fixed
//! local timezone offset from configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
    /// Fixed local timezone offset in minutes for day bucketing
    timezone_offset_minutes: i32,
}

/// One day of sales for the trend chart
#[derive(Debug, Serialize, FromRow)]
pub struct DailySalesPoint {
    pub day: NaiveDate,
    pub shipment_count: i64,
    pub total: Decimal,
}

/// On-hand stock for one product
#[derive(Debug, Serialize, FromRow)]
pub struct StockOnHand {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub batch_count: i64,
}

/// Stock valuation for one warehouse
#[derive(Debug, Serialize, FromRow)]
pub struct WarehouseValuation {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i64,
    pub total_value: Decimal,
}

/// Write-off loss summary
#[derive(Debug, Serialize, FromRow)]
pub struct LossSummary {
    pub reconciliation_count: i64,
    pub total_loss: Decimal,
}

/// Report filter parameters
#[derive(Debug, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub warehouse_id: Option<Uuid>,
}

/// Row shape for the CSV export of outbound history
#[derive(Debug, FromRow, Serialize)]
struct OutboundExportRow {
    shipment_id: Uuid,
    shipped_at: String,
    warehouse_name: String,
    product_name: String,
    quantity: i64,
    unit_price: Decimal,
    discount_kind: String,
    discount_value: Decimal,
    subtotal: Decimal,
    reversed: bool,
}

impl ReportingService {
    pub fn new(db: PgPool, timezone_offset_minutes: i32) -> Self {
        Self {
            db,
            timezone_offset_minutes,
        }
    }

    /// Daily sales totals for the trend chart, reversed shipments excluded
    pub async fn get_daily_sales(&self, filter: &ReportFilter) -> AppResult<Vec<DailySalesPoint>> {
        let start = filter
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = filter
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

        let points = sqlx::query_as::<_, DailySalesPoint>(
            r#"
            SELECT (shipped_at + make_interval(mins => $1))::date AS day,
                   COUNT(*) AS shipment_count,
                   COALESCE(SUM(total), 0) AS total
            FROM outbound_shipments
            WHERE reversed = FALSE
              AND (shipped_at + make_interval(mins => $1))::date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR warehouse_id = $4)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(self.timezone_offset_minutes)
        .bind(start)
        .bind(end)
        .bind(filter.warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(points)
    }

    /// On-hand quantity per product, summed across batches
    pub async fn get_stock_on_hand(
        &self,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Vec<StockOnHand>> {
        let rows = sqlx::query_as::<_, StockOnHand>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name,
                   COALESCE(SUM(b.quantity), 0) AS quantity,
                   COUNT(b.id) FILTER (WHERE b.quantity > 0) AS batch_count
            FROM products p
            LEFT JOIN batches b ON b.product_id = p.id
                AND ($1::uuid IS NULL OR b.warehouse_id = $1)
            WHERE p.is_active = TRUE
            GROUP BY p.id, p.name
            ORDER BY p.name
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Products at or below the low-stock threshold
    pub async fn get_low_stock(&self, threshold: i64) -> AppResult<Vec<StockOnHand>> {
        let rows = self.get_stock_on_hand(None).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.quantity <= threshold)
            .collect())
    }

    /// Stock value (quantity x buying cost) per warehouse
    pub async fn get_valuation(&self) -> AppResult<Vec<WarehouseValuation>> {
        let rows = sqlx::query_as::<_, WarehouseValuation>(
            r#"
            SELECT w.id AS warehouse_id, w.name AS warehouse_name,
                   COALESCE(SUM(b.quantity), 0) AS quantity,
                   COALESCE(SUM(b.quantity * b.unit_cost), 0) AS total_value
            FROM warehouses w
            LEFT JOIN batches b ON b.warehouse_id = w.id
            WHERE w.is_active = TRUE
            GROUP BY w.id, w.name
            ORDER BY w.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Total write-off loss, reversed reconciliations excluded
    pub async fn get_loss_summary(&self, filter: &ReportFilter) -> AppResult<LossSummary> {
        let start = filter
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = filter
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

        let summary = sqlx::query_as::<_, LossSummary>(
            r#"
            SELECT COUNT(*) AS reconciliation_count,
                   COALESCE(SUM(total_loss), 0) AS total_loss
            FROM stock_reconciliations
            WHERE reversed = FALSE
              AND (adjusted_at + make_interval(mins => $1))::date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR warehouse_id = $4)
            "#,
        )
        .bind(self.timezone_offset_minutes)
        .bind(start)
        .bind(end)
        .bind(filter.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }

    /// Export outbound history (including reversed rows) as CSV
    pub async fn export_outbound_csv(&self, filter: &ReportFilter) -> AppResult<Vec<u8>> {
        let start = filter
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = filter
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

        let rows = sqlx::query_as::<_, OutboundExportRow>(
            r#"
            SELECT s.id AS shipment_id,
                   to_char(s.shipped_at + make_interval(mins => $1), 'YYYY-MM-DD HH24:MI') AS shipped_at,
                   w.name AS warehouse_name,
                   p.name AS product_name,
                   l.quantity, l.unit_price, l.discount_kind, l.discount_value, l.subtotal,
                   s.reversed
            FROM outbound_lines l
            JOIN outbound_shipments s ON s.id = l.shipment_id
            JOIN warehouses w ON w.id = s.warehouse_id
            JOIN products p ON p.id = l.product_id
            WHERE (s.shipped_at + make_interval(mins => $1))::date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR s.warehouse_id = $4)
            ORDER BY s.shipped_at, s.id, l.seq
            "#,
        )
        .bind(self.timezone_offset_minutes)
        .bind(start)
        .bind(end)
        .bind(filter.warehouse_id)
        .fetch_all(&self.db)
        .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))
    }
}
