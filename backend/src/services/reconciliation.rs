//! Stock reconciliation service (loss / write-off)
//!
//! A reconciliation destroys quantity: damaged, expired or miscounted
//! stock is drained from batches FIFO and the loss valued at each batch's
//! buying cost. Reversal puts the quantity back on the same batches.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::batch;
use shared::ledger::{allocate, guard_not_reversed, LedgerError};
use shared::types::Pagination;
use shared::validation::validate_quantity;

/// Stock reconciliation service
#[derive(Clone)]
pub struct ReconciliationService {
    db: PgPool,
}

/// Persisted reconciliation header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockReconciliation {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub adjusted_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub total_loss: Decimal,
    pub reversed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Persisted reconciliation line (one per batch drawn from)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockReconciliationLine {
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub source_batch_id: Uuid,
    pub unit_cost: Decimal,
    pub subtotal: Decimal,
}

/// Reconciliation with its lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct StockReconciliationDetail {
    #[serde(flatten)]
    pub reconciliation: StockReconciliation,
    pub lines: Vec<StockReconciliationLine>,
}

/// One requested product line of a new reconciliation
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationLineInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Input for creating a stock reconciliation
#[derive(Debug, Deserialize)]
pub struct CreateReconciliationInput {
    pub warehouse_id: Uuid,
    pub lines: Vec<ReconciliationLineInput>,
    pub notes: Option<String>,
    pub adjusted_at: Option<DateTime<Utc>>,
}

impl ReconciliationService {
    /// Create a new ReconciliationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Write off stock as loss
    pub async fn create_reconciliation(
        &self,
        user_id: Uuid,
        input: CreateReconciliationInput,
    ) -> AppResult<StockReconciliationDetail> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "Reconciliation must contain at least one line".to_string(),
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

        let adjusted_at = input.adjusted_at.unwrap_or_else(Utc::now);

        let mut requested = input.lines.clone();
        requested.sort_by_key(|l| l.product_id);

        let mut tx = self.db.begin().await?;

        // Stage draws before writing the header so total_loss is final
        let mut staged: Vec<(Uuid, i64, Uuid, Decimal, Decimal)> = Vec::new();
        let mut total_loss = Decimal::ZERO;

        for req in &requested {
            let product_name = sqlx::query_scalar::<_, String>(
                "SELECT name FROM products WHERE id = $1 AND is_active = TRUE",
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

            for draw in &draws {
                batch::consume(&mut *tx, draw.lot_id, draw.quantity).await?;

                // Loss is valued at the batch's buying cost
                let subtotal = Decimal::from(draw.quantity) * draw.unit_cost;
                total_loss += subtotal;
                staged.push((
                    req.product_id,
                    draw.quantity,
                    draw.lot_id,
                    draw.unit_cost,
                    subtotal,
                ));
            }
        }

        let reconciliation = sqlx::query_as::<_, StockReconciliation>(
            r#"
            INSERT INTO stock_reconciliations (warehouse_id, adjusted_at, notes, total_loss, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, warehouse_id, adjusted_at, notes, total_loss, reversed, created_at, created_by
            "#,
        )
        .bind(input.warehouse_id)
        .bind(adjusted_at)
        .bind(&input.notes)
        .bind(total_loss)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(staged.len());
        for (product_id, quantity, source_batch_id, unit_cost, subtotal) in &staged {
            let line = sqlx::query_as::<_, StockReconciliationLine>(
                r#"
                INSERT INTO stock_reconciliation_lines
                    (reconciliation_id, product_id, quantity, source_batch_id, unit_cost, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, reconciliation_id, product_id, quantity, source_batch_id, unit_cost, subtotal
                "#,
            )
            .bind(reconciliation.id)
            .bind(product_id)
            .bind(quantity)
            .bind(source_batch_id)
            .bind(unit_cost)
            .bind(subtotal)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(line);
        }

        tx.commit().await?;

        tracing::info!(
            reconciliation_id = %reconciliation.id,
            total_loss = %reconciliation.total_loss,
            "stock reconciliation created"
        );

        Ok(StockReconciliationDetail {
            reconciliation,
            lines,
        })
    }

    /// Reverse a reconciliation, restoring the written-off quantity
    pub async fn reverse_reconciliation(&self, reconciliation_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let reconciliation = sqlx::query_as::<_, StockReconciliation>(
            r#"
            SELECT id, warehouse_id, adjusted_at, notes, total_loss, reversed, created_at, created_by
            FROM stock_reconciliations WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(reconciliation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock reconciliation".to_string()))?;

        guard_not_reversed(reconciliation.reversed)
            .map_err(|_| AppError::AlreadyReversed("Stock reconciliation".to_string()))?;

        let lines = sqlx::query_as::<_, StockReconciliationLine>(
            r#"
            SELECT id, reconciliation_id, product_id, quantity, source_batch_id, unit_cost, subtotal
            FROM stock_reconciliation_lines WHERE reconciliation_id = $1
            ORDER BY seq
            "#,
        )
        .bind(reconciliation_id)
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

        sqlx::query("UPDATE stock_reconciliations SET reversed = TRUE WHERE id = $1")
            .bind(reconciliation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(reconciliation_id = %reconciliation_id, "stock reconciliation reversed");

        Ok(())
    }

    /// Get a reconciliation with its lines
    pub async fn get_reconciliation(
        &self,
        reconciliation_id: Uuid,
    ) -> AppResult<StockReconciliationDetail> {
        let reconciliation = sqlx::query_as::<_, StockReconciliation>(
            r#"
            SELECT id, warehouse_id, adjusted_at, notes, total_loss, reversed, created_at, created_by
            FROM stock_reconciliations WHERE id = $1
            "#,
        )
        .bind(reconciliation_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock reconciliation".to_string()))?;

        let lines = sqlx::query_as::<_, StockReconciliationLine>(
            r#"
            SELECT id, reconciliation_id, product_id, quantity, source_batch_id, unit_cost, subtotal
            FROM stock_reconciliation_lines WHERE reconciliation_id = $1
            ORDER BY seq
            "#,
        )
        .bind(reconciliation_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockReconciliationDetail {
            reconciliation,
            lines,
        })
    }

    /// List reconciliations, newest first
    pub async fn list_reconciliations(
        &self,
        pagination: &Pagination,
    ) -> AppResult<Vec<StockReconciliation>> {
        let reconciliations = sqlx::query_as::<_, StockReconciliation>(
            r#"
            SELECT id, warehouse_id, adjusted_at, notes, total_loss, reversed, created_at, created_by
            FROM stock_reconciliations
            ORDER BY adjusted_at DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(reconciliations)
    }
}
