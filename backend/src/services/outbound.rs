//! Outbound shipment service (point of sale)
//!
//! Each requested product line drains batches oldest-first; when FIFO
//! crosses a batch boundary the line expands into one sub-line per batch
//! drawn, each carrying that batch's buying cost for margin tracing. The
//! line discount is validated against the whole line's subtotal and then
//! anchored onto the last sub-line.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::batch;
use shared::ledger::{
    allocate, apply_to_last, discount_amount, guard_not_reversed, validate_discount, DiscountKind,
    LedgerError,
};
use shared::types::Pagination;
use shared::validation::validate_quantity;

/// Outbound shipment service
#[derive(Clone)]
pub struct OutboundService {
    db: PgPool,
}

/// Persisted shipment header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OutboundShipment {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub shipped_at: DateTime<Utc>,
    pub total: Decimal,
    pub reversed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Persisted shipment sub-line (one per batch drawn from)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OutboundLine {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub source_batch_id: Uuid,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub discount_kind: String,
    pub discount_value: Decimal,
    pub subtotal: Decimal,
}

/// Shipment with its sub-lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct OutboundShipmentDetail {
    #[serde(flatten)]
    pub shipment: OutboundShipment,
    pub lines: Vec<OutboundLine>,
}

/// One requested product line of a new shipment
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundLineInput {
    pub product_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub discount_kind: DiscountKind,
    #[serde(default)]
    pub discount_value: Decimal,
}

/// Input for creating an outbound shipment
#[derive(Debug, Deserialize)]
pub struct CreateOutboundInput {
    pub warehouse_id: Uuid,
    pub lines: Vec<OutboundLineInput>,
    pub shipped_at: Option<DateTime<Utc>>,
}

/// A sub-line staged for insertion once the whole shipment validated
struct PendingLine {
    product_id: Uuid,
    quantity: i64,
    source_batch_id: Uuid,
    unit_cost: Decimal,
    unit_price: Decimal,
    discount_kind: DiscountKind,
    discount_value: Decimal,
    subtotal: Decimal,
}

impl OutboundService {
    /// Create a new OutboundService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an outbound shipment, consuming stock FIFO
    pub async fn create_outbound(
        &self,
        user_id: Uuid,
        input: CreateOutboundInput,
    ) -> AppResult<OutboundShipmentDetail> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "Shipment must contain at least one line".to_string(),
            });
        }

        for line in &input.lines {
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
        }

        let warehouse_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        if !warehouse_exists {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        let shipped_at = input.shipped_at.unwrap_or_else(Utc::now);

        // Lock products in a stable order so two concurrent shipments
        // cannot take the same row locks in opposite order.
        let mut requested = input.lines.clone();
        requested.sort_by_key(|l| l.product_id);

        let mut tx = self.db.begin().await?;

        let mut pending: Vec<PendingLine> = Vec::new();
        let mut total = Decimal::ZERO;

        for req in &requested {
            let (product_name, selling_price) = sqlx::query_as::<_, (String, Decimal)>(
                "SELECT name, selling_price FROM products WHERE id = $1 AND is_active = TRUE",
            )
            .bind(req.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let lots =
                batch::lock_for_allocation(&mut *tx, req.product_id, input.warehouse_id).await?;

            let draws = allocate(&lots, req.quantity).map_err(|e| match e {
                LedgerError::InsufficientStock {
                    requested,
                    available,
                } => AppError::InsufficientStock(format!(
                    "{}: requested {}, available {}",
                    product_name, requested, available
                )),
                other => AppError::Internal(other.to_string()),
            })?;

            // Pre-discount subtotal of the whole requested line
            let mut subtotals: Vec<Decimal> = draws
                .iter()
                .map(|d| Decimal::from(d.quantity) * selling_price)
                .collect();
            let line_subtotal: Decimal = subtotals.iter().copied().sum();

            // Discount bounds checked before any totals or batches mutate
            validate_discount(req.discount_kind, req.discount_value, line_subtotal)
                .map_err(|e| AppError::InvalidDiscount(format!("{}: {}", product_name, e)))?;
            let discount = discount_amount(req.discount_kind, req.discount_value, line_subtotal);
            apply_to_last(&mut subtotals, discount);

            total += line_subtotal - discount;

            for (draw, subtotal) in draws.iter().zip(subtotals) {
                batch::consume(&mut *tx, draw.lot_id, draw.quantity).await?;
                pending.push(PendingLine {
                    product_id: req.product_id,
                    quantity: draw.quantity,
                    source_batch_id: draw.lot_id,
                    unit_cost: draw.unit_cost,
                    unit_price: selling_price,
                    discount_kind: req.discount_kind,
                    discount_value: req.discount_value,
                    subtotal,
                });
            }
        }

        let shipment = sqlx::query_as::<_, OutboundShipment>(
            r#"
            INSERT INTO outbound_shipments (warehouse_id, shipped_at, total, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, warehouse_id, shipped_at, total, reversed, created_at, created_by
            "#,
        )
        .bind(input.warehouse_id)
        .bind(shipped_at)
        .bind(total)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(pending.len());
        for p in &pending {
            let line = sqlx::query_as::<_, OutboundLine>(
                r#"
                INSERT INTO outbound_lines
                    (shipment_id, product_id, quantity, source_batch_id, unit_cost,
                     unit_price, discount_kind, discount_value, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, shipment_id, product_id, quantity, source_batch_id, unit_cost,
                          unit_price, discount_kind, discount_value, subtotal
                "#,
            )
            .bind(shipment.id)
            .bind(p.product_id)
            .bind(p.quantity)
            .bind(p.source_batch_id)
            .bind(p.unit_cost)
            .bind(p.unit_price)
            .bind(p.discount_kind.as_str())
            .bind(p.discount_value)
            .bind(p.subtotal)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(line);
        }

        tx.commit().await?;

        tracing::info!(shipment_id = %shipment.id, total = %shipment.total, "outbound shipment created");

        Ok(OutboundShipmentDetail { shipment, lines })
    }

    /// Reverse a shipment, restoring every drawn batch
    pub async fn reverse_outbound(&self, shipment_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let shipment = sqlx::query_as::<_, OutboundShipment>(
            r#"
            SELECT id, warehouse_id, shipped_at, total, reversed, created_at, created_by
            FROM outbound_shipments WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(shipment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Outbound shipment".to_string()))?;

        guard_not_reversed(shipment.reversed)
            .map_err(|_| AppError::AlreadyReversed("Outbound shipment".to_string()))?;

        let lines = sqlx::query_as::<_, OutboundLine>(
            r#"
            SELECT id, shipment_id, product_id, quantity, source_batch_id, unit_cost,
                   unit_price, discount_kind, discount_value, subtotal
            FROM outbound_lines WHERE shipment_id = $1
            ORDER BY seq
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            let restored = batch::restore(&mut *tx, line.source_batch_id, line.quantity).await?;
            if !restored {
                return Err(AppError::BatchMissing(format!(
                    "batch {} for product {} no longer exists",
                    line.source_batch_id, line.product_id
                )));
            }
        }

        sqlx::query("UPDATE outbound_shipments SET reversed = TRUE WHERE id = $1")
            .bind(shipment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(shipment_id = %shipment_id, "outbound shipment reversed");

        Ok(())
    }

    /// Get a shipment with its sub-lines
    pub async fn get_outbound(&self, shipment_id: Uuid) -> AppResult<OutboundShipmentDetail> {
        let shipment = sqlx::query_as::<_, OutboundShipment>(
            r#"
            SELECT id, warehouse_id, shipped_at, total, reversed, created_at, created_by
            FROM outbound_shipments WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Outbound shipment".to_string()))?;

        let lines = sqlx::query_as::<_, OutboundLine>(
            r#"
            SELECT id, shipment_id, product_id, quantity, source_batch_id, unit_cost,
                   unit_price, discount_kind, discount_value, subtotal
            FROM outbound_lines WHERE shipment_id = $1
            ORDER BY seq
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OutboundShipmentDetail { shipment, lines })
    }

    /// List shipments, newest first
    pub async fn list_outbound(&self, pagination: &Pagination) -> AppResult<Vec<OutboundShipment>> {
        let shipments = sqlx::query_as::<_, OutboundShipment>(
            r#"
            SELECT id, warehouse_id, shipped_at, total, reversed, created_at, created_by
            FROM outbound_shipments
            ORDER BY shipped_at DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(shipments)
    }
}
