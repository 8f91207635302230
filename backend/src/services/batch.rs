//! Batch store access shared by the ledger services
//!
//! All stock-consuming operations go through `lock_for_allocation`: the
//! batch rows for one (product, warehouse) pair are locked before the
//! availability check, so validate-then-drain runs as one atomic unit and
//! two concurrent operations cannot both pass validation against the same
//! stale total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::AppResult;
use shared::ledger::Lot;

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    quantity: i64,
    unit_cost: Decimal,
    arrived_at: DateTime<Utc>,
    origin_inbound_id: Uuid,
}

/// Lock the live batch set for one (product, warehouse) pair and return it
/// in FIFO order (arrival ascending, creation order on ties).
pub async fn lock_for_allocation(
    conn: &mut PgConnection,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> AppResult<Vec<Lot>> {
    let rows = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, quantity, unit_cost, arrived_at, origin_inbound_id
        FROM batches
        WHERE product_id = $1 AND warehouse_id = $2 AND quantity > 0
        ORDER BY arrived_at, seq
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Lot {
            id: r.id,
            quantity: r.quantity,
            unit_cost: r.unit_cost,
            arrived_at: r.arrived_at,
            origin_inbound_id: r.origin_inbound_id,
        })
        .collect())
}

/// Decrement a batch after allocation. The CHECK constraint on quantity
/// backstops the allocator: a negative result aborts the transaction.
pub async fn consume(conn: &mut PgConnection, batch_id: Uuid, quantity: i64) -> AppResult<()> {
    sqlx::query("UPDATE batches SET quantity = quantity - $1 WHERE id = $2")
        .bind(quantity)
        .bind(batch_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Add quantity back to a batch during reversal. Returns false when the
/// batch row no longer exists (deleted by an inbound reversal).
pub async fn restore(conn: &mut PgConnection, batch_id: Uuid, quantity: i64) -> AppResult<bool> {
    let result = sqlx::query("UPDATE batches SET quantity = quantity + $1 WHERE id = $2")
        .bind(quantity)
        .bind(batch_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
