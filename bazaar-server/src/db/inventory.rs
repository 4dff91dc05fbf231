//! Inventory repository
//!
//! Low-level stock reads/writes. The new stock level is always computed
//! inside the database (`stock = stock - $n` with a guard), never as
//! read-then-write arithmetic in Rust, so concurrent decrements serialize
//! on the product row.

use shared::models::{InventoryRecord, StockMovement};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(sqlx::FromRow)]
struct InventoryRow {
    product_id: String,
    stock: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: String,
    product_id: String,
    delta: i64,
    resulting_stock: i64,
    reason: String,
    created_at: i64,
}

impl From<MovementRow> for StockMovement {
    fn from(r: MovementRow) -> Self {
        StockMovement {
            id: r.id,
            product_id: r.product_id,
            delta: r.delta,
            resulting_stock: r.resulting_stock,
            reason: r.reason,
            created_at: r.created_at,
        }
    }
}

pub async fn get_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT stock FROM inventory WHERE product_id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(s,)| s))
}

/// Conditional decrement: no-op (0 rows) when the result would go negative
pub async fn try_decrement(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE inventory SET stock = stock - $1, updated_at = $2
         WHERE product_id = $3 AND stock >= $1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn increment(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE inventory SET stock = stock + $1, updated_at = $2 WHERE product_id = $3",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn set_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE inventory SET stock = $1, updated_at = $2 WHERE product_id = $3")
            .bind(quantity)
            .bind(now)
            .bind(product_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

/// Append an audit entry; must run in the same transaction as the mutation
pub async fn insert_movement(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    resulting_stock: i64,
    reason: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock_movements (id, product_id, delta, resulting_stock, reason, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(delta)
    .bind(resulting_stock)
    .bind(reason)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Most recent audit entries for a product
pub async fn movements_for(
    pool: &SqlitePool,
    product_id: &str,
    limit: i64,
) -> Result<Vec<StockMovement>, sqlx::Error> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        "SELECT * FROM stock_movements WHERE product_id = $1
         ORDER BY created_at DESC, rowid DESC LIMIT $2",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(StockMovement::from).collect())
}

pub async fn find_record(
    pool: &SqlitePool,
    product_id: &str,
) -> Result<Option<InventoryRecord>, sqlx::Error> {
    let row: Option<InventoryRow> =
        sqlx::query_as("SELECT * FROM inventory WHERE product_id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| InventoryRecord {
        product_id: r.product_id,
        stock: r.stock,
        updated_at: r.updated_at,
    }))
}
