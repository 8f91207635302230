//! Inter-warehouse stock movement service
//!
//! Moving stock drains source batches FIFO and creates equal destination
//! batches that keep the original cost, arrival time and origin receipt,
//! so FIFO order and traceability survive the move. Each movement line
//! records both the destination batch it created and the source batch it
//! drained, which makes reversal exact instead of reconstructed.

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

/// Stock movement service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// Persisted movement header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub moved_at: DateTime<Utc>,
    pub reversed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Persisted movement line (one per source batch drained)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementLine {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub destination_batch_id: Uuid,
    pub source_batch_id: Uuid,
}

/// Movement with its lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct StockMovementDetail {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub lines: Vec<StockMovementLine>,
}

/// One requested product line of a new movement
#[derive(Debug, Clone, Deserialize)]
pub struct MovementLineInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Input for creating a stock movement
#[derive(Debug, Deserialize)]
pub struct CreateMovementInput {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub lines: Vec<MovementLineInput>,
    pub moved_at: Option<DateTime<Utc>>,
}

/// Destination batch attributes needed during reversal
#[derive(Debug, FromRow)]
struct DestinationBatch {
    product_id: Uuid,
    quantity: i64,
    unit_cost: Decimal,
    arrived_at: DateTime<Utc>,
    origin_inbound_id: Uuid,
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Move stock between warehouses
    pub async fn create_movement(
        &self,
        user_id: Uuid,
        input: CreateMovementInput,
    ) -> AppResult<StockMovementDetail> {
        if input.from_warehouse_id == input.to_warehouse_id {
            return Err(AppError::InvalidMovement(
                "source and destination warehouse must differ".to_string(),
            ));
        }

        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "Movement must contain at least one line".to_string(),
            });
        }

        for line in &input.lines {
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
        }

        for warehouse_id in [input.from_warehouse_id, input.to_warehouse_id] {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND is_active = TRUE)",
            )
            .bind(warehouse_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Warehouse".to_string()));
            }
        }

        let moved_at = input.moved_at.unwrap_or_else(Utc::now);

        let mut requested = input.lines.clone();
        requested.sort_by_key(|l| l.product_id);

        let mut tx = self.db.begin().await?;

        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (from_warehouse_id, to_warehouse_id, moved_at, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, from_warehouse_id, to_warehouse_id, moved_at, reversed, created_at, created_by
            "#,
        )
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(moved_at)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::new();
        for req in &requested {
            let product_name = sqlx::query_scalar::<_, String>(
                "SELECT name FROM products WHERE id = $1 AND is_active = TRUE",
            )
            .bind(req.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let lots =
                batch::lock_for_allocation(&mut *tx, req.product_id, input.from_warehouse_id)
                    .await?;

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

                // Destination batch keeps cost, arrival and origin so FIFO
                // order is preserved across the move
                let destination_batch_id = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO batches
                        (product_id, warehouse_id, quantity, unit_cost, arrived_at, origin_inbound_id)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                    "#,
                )
                .bind(req.product_id)
                .bind(input.to_warehouse_id)
                .bind(draw.quantity)
                .bind(draw.unit_cost)
                .bind(draw.arrived_at)
                .bind(draw.origin_inbound_id)
                .fetch_one(&mut *tx)
                .await?;

                let line = sqlx::query_as::<_, StockMovementLine>(
                    r#"
                    INSERT INTO stock_movement_lines
                        (movement_id, product_id, quantity, destination_batch_id, source_batch_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, movement_id, product_id, quantity, destination_batch_id, source_batch_id
                    "#,
                )
                .bind(movement.id)
                .bind(req.product_id)
                .bind(draw.quantity)
                .bind(destination_batch_id)
                .bind(draw.lot_id)
                .fetch_one(&mut *tx)
                .await?;

                lines.push(line);
            }
        }

        tx.commit().await?;

        tracing::info!(movement_id = %movement.id, lines = lines.len(), "stock movement created");

        Ok(StockMovementDetail { movement, lines })
    }

    /// Reverse a movement, returning stock to the source warehouse
    pub async fn reverse_movement(&self, movement_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, from_warehouse_id, to_warehouse_id, moved_at, reversed, created_at, created_by
            FROM stock_movements WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))?;

        guard_not_reversed(movement.reversed)
            .map_err(|_| AppError::AlreadyReversed("Stock movement".to_string()))?;

        let lines = sqlx::query_as::<_, StockMovementLine>(
            r#"
            SELECT id, movement_id, product_id, quantity, destination_batch_id, source_batch_id
            FROM stock_movement_lines WHERE movement_id = $1
            ORDER BY seq
            "#,
        )
        .bind(movement_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            let dest = sqlx::query_as::<_, DestinationBatch>(
                r#"
                SELECT product_id, quantity, unit_cost, arrived_at, origin_inbound_id
                FROM batches WHERE id = $1
                FOR UPDATE
                "#,
            )
            .bind(line.destination_batch_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::BatchMissing(format!(
                    "destination batch {} for product {} no longer exists",
                    line.destination_batch_id, line.product_id
                ))
            })?;

            // Moved stock must still be on hand at the destination
            if dest.quantity < line.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "product {}: {} of {} moved units already consumed at destination",
                    line.product_id,
                    line.quantity - dest.quantity,
                    line.quantity
                )));
            }

            batch::consume(&mut *tx, line.destination_batch_id, line.quantity).await?;

            // Restore the recorded source batch; fall back to attribute
            // matching, then to a fresh restorative batch, when it is gone.
            let restored = batch::restore(&mut *tx, line.source_batch_id, line.quantity).await?;
            if !restored {
                let matched = sqlx::query(
                    r#"
                    UPDATE batches SET quantity = quantity + $1
                    WHERE id = (
                        SELECT id FROM batches
                        WHERE product_id = $2 AND warehouse_id = $3
                          AND unit_cost = $4 AND arrived_at = $5 AND origin_inbound_id = $6
                        ORDER BY seq
                        LIMIT 1
                    )
                    "#,
                )
                .bind(line.quantity)
                .bind(dest.product_id)
                .bind(movement.from_warehouse_id)
                .bind(dest.unit_cost)
                .bind(dest.arrived_at)
                .bind(dest.origin_inbound_id)
                .execute(&mut *tx)
                .await?;

                if matched.rows_affected() == 0 {
                    sqlx::query(
                        r#"
                        INSERT INTO batches
                            (product_id, warehouse_id, quantity, unit_cost, arrived_at, origin_inbound_id)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(dest.product_id)
                    .bind(movement.from_warehouse_id)
                    .bind(line.quantity)
                    .bind(dest.unit_cost)
                    .bind(dest.arrived_at)
                    .bind(dest.origin_inbound_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        sqlx::query("UPDATE stock_movements SET reversed = TRUE WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(movement_id = %movement_id, "stock movement reversed");

        Ok(())
    }

    /// Get a movement with its lines
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<StockMovementDetail> {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, from_warehouse_id, to_warehouse_id, moved_at, reversed, created_at, created_by
            FROM stock_movements WHERE id = $1
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))?;

        let lines = sqlx::query_as::<_, StockMovementLine>(
            r#"
            SELECT id, movement_id, product_id, quantity, destination_batch_id, source_batch_id
            FROM stock_movement_lines WHERE movement_id = $1
            ORDER BY seq
            "#,
        )
        .bind(movement_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockMovementDetail { movement, lines })
    }

    /// List movements, newest first
    pub async fn list_movements(&self, pagination: &Pagination) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, from_warehouse_id, to_warehouse_id, moved_at, reversed, created_at, created_by
            FROM stock_movements
            ORDER BY moved_at DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }
}
