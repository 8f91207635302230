//! Inbound receipt service
//!
//! A supplier delivery creates one receipt plus one batch per merged line.
//! Reversing a receipt deletes its batches again, but only while every
//! unit is still on hand; once downstream operations consumed any of it
//! the reversal is refused instead of silently shrinking history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ledger::receipt::{merge_lines, receipt_total, ReceiptLine};
use shared::ledger::{guard_fully_on_hand, guard_not_reversed, LedgerError};
use shared::types::Pagination;
use shared::validation::{validate_quantity, validate_unit_cost};

/// Inbound receipt service
#[derive(Clone)]
pub struct InboundService {
    db: PgPool,
}

/// Persisted inbound receipt header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InboundReceipt {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub total: Decimal,
    pub reversed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Persisted inbound line (post-merge, 1:1 with a batch)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InboundLine {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub subtotal: Decimal,
}

/// Receipt with its lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct InboundReceiptDetail {
    #[serde(flatten)]
    pub receipt: InboundReceipt,
    pub lines: Vec<InboundLine>,
}

/// One requested line of a new receipt
#[derive(Debug, Clone, Deserialize)]
pub struct InboundLineInput {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// Input for creating an inbound receipt
#[derive(Debug, Deserialize)]
pub struct CreateInboundInput {
    pub warehouse_id: Uuid,
    pub lines: Vec<InboundLineInput>,
    pub received_at: Option<DateTime<Utc>>,
}

impl InboundService {
    /// Create a new InboundService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a supplier delivery: one receipt, one batch per merged line
    pub async fn create_inbound(
        &self,
        user_id: Uuid,
        input: CreateInboundInput,
    ) -> AppResult<InboundReceiptDetail> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "Receipt must contain at least one line".to_string(),
            });
        }

        for line in &input.lines {
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
            validate_unit_cost(line.unit_cost).map_err(|msg| AppError::Validation {
                field: "unit_cost".to_string(),
                message: msg.to_string(),
            })?;
        }

        // Validate warehouse is active
        let warehouse_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        if !warehouse_exists {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        // Validate every product is active
        for line in &input.lines {
            let product_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND is_active = TRUE)",
            )
            .bind(line.product_id)
            .fetch_one(&self.db)
            .await?;

            if !product_exists {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }

        // Merge duplicate (product, unit_cost) lines before persisting
        let raw: Vec<ReceiptLine> = input
            .lines
            .iter()
            .map(|l| ReceiptLine {
                product_id: l.product_id,
                quantity: l.quantity,
                unit_cost: l.unit_cost,
            })
            .collect();
        let merged = merge_lines(&raw);
        let total = receipt_total(&merged);
        let received_at = input.received_at.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;

        let receipt = sqlx::query_as::<_, InboundReceipt>(
            r#"
            INSERT INTO inbound_receipts (warehouse_id, received_at, total, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, warehouse_id, received_at, total, reversed, created_at, created_by
            "#,
        )
        .bind(input.warehouse_id)
        .bind(received_at)
        .bind(total)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(merged.len());
        for m in &merged {
            let line = sqlx::query_as::<_, InboundLine>(
                r#"
                INSERT INTO inbound_lines (receipt_id, product_id, quantity, unit_cost, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, receipt_id, product_id, quantity, unit_cost, subtotal
                "#,
            )
            .bind(receipt.id)
            .bind(m.product_id)
            .bind(m.quantity)
            .bind(m.unit_cost)
            .bind(m.subtotal)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO batches
                    (product_id, warehouse_id, quantity, unit_cost, arrived_at, origin_inbound_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(m.product_id)
            .bind(input.warehouse_id)
            .bind(m.quantity)
            .bind(m.unit_cost)
            .bind(received_at)
            .bind(receipt.id)
            .execute(&mut *tx)
            .await?;

            lines.push(line);
        }

        tx.commit().await?;

        tracing::info!(receipt_id = %receipt.id, lines = lines.len(), "inbound receipt created");

        Ok(InboundReceiptDetail { receipt, lines })
    }

    /// Reverse an inbound receipt, deleting the batches it created
    ///
    /// Refused with `PartiallyConsumed` when any unit of any batch has
    /// already been sold, moved or written off.
    pub async fn reverse_inbound(&self, receipt_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let receipt = sqlx::query_as::<_, InboundReceipt>(
            r#"
            SELECT id, warehouse_id, received_at, total, reversed, created_at, created_by
            FROM inbound_receipts WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Inbound receipt".to_string()))?;

        guard_not_reversed(receipt.reversed)
            .map_err(|_| AppError::AlreadyReversed("Inbound receipt".to_string()))?;

        let lines = sqlx::query_as::<_, InboundLine>(
            r#"
            SELECT id, receipt_id, product_id, quantity, unit_cost, subtotal
            FROM inbound_lines WHERE receipt_id = $1
            ORDER BY seq
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&mut *tx)
        .await?;

        // Every unit must still be on hand somewhere. Batches created by a
        // stock movement carry the origin receipt id forward, so moved but
        // unsold stock still counts.
        for line in &lines {
            let rows = sqlx::query_as::<_, (i64,)>(
                r#"
                SELECT quantity FROM batches
                WHERE origin_inbound_id = $1 AND product_id = $2 AND unit_cost = $3
                FOR UPDATE
                "#,
            )
            .bind(receipt_id)
            .bind(line.product_id)
            .bind(line.unit_cost)
            .fetch_all(&mut *tx)
            .await?;

            let remaining: i64 = rows.iter().map(|r| r.0).sum();
            guard_fully_on_hand(line.quantity, remaining).map_err(|e| match e {
                LedgerError::PartiallyConsumed { created, consumed } => {
                    AppError::PartiallyConsumed(format!(
                        "product {}: {} of {} units already consumed downstream",
                        line.product_id, consumed, created
                    ))
                }
                other => AppError::Internal(other.to_string()),
            })?;
        }

        sqlx::query("DELETE FROM batches WHERE origin_inbound_id = $1")
            .bind(receipt_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE inbound_receipts SET reversed = TRUE WHERE id = $1")
            .bind(receipt_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(receipt_id = %receipt_id, "inbound receipt reversed");

        Ok(())
    }

    /// Get a receipt with its lines
    pub async fn get_inbound(&self, receipt_id: Uuid) -> AppResult<InboundReceiptDetail> {
        let receipt = sqlx::query_as::<_, InboundReceipt>(
            r#"
            SELECT id, warehouse_id, received_at, total, reversed, created_at, created_by
            FROM inbound_receipts WHERE id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inbound receipt".to_string()))?;

        let lines = sqlx::query_as::<_, InboundLine>(
            r#"
            SELECT id, receipt_id, product_id, quantity, unit_cost, subtotal
            FROM inbound_lines WHERE receipt_id = $1
            ORDER BY seq
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&self.db)
        .await?;

        Ok(InboundReceiptDetail { receipt, lines })
    }

    /// List receipts, newest first
    pub async fn list_inbound(&self, pagination: &Pagination) -> AppResult<Vec<InboundReceipt>> {
        let receipts = sqlx::query_as::<_, InboundReceipt>(
            r#"
            SELECT id, warehouse_id, received_at, total, reversed, created_at, created_by
            FROM inbound_receipts
            ORDER BY received_at DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(receipts)
    }
}
