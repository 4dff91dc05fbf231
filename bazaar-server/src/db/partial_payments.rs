//! Partial payment repository

use shared::models::{PartialPayment, PartialPaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(sqlx::FromRow)]
struct PartialPaymentRow {
    id: String,
    order_id: String,
    amount: f64,
    method: String,
    transaction_ref: Option<String>,
    status: String,
    created_at: i64,
    completed_at: Option<i64>,
    refunded_at: Option<i64>,
}

impl PartialPaymentRow {
    fn into_model(self) -> Result<PartialPayment, sqlx::Error> {
        let status = PartialPaymentStatus::from_db(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid partial payment status: {}", self.status).into())
        })?;
        Ok(PartialPayment {
            id: self.id,
            order_id: self.order_id,
            amount: self.amount,
            method: self.method,
            transaction_ref: self.transaction_ref,
            status,
            created_at: self.created_at,
            completed_at: self.completed_at,
            refunded_at: self.refunded_at,
        })
    }
}

/// Insert a new PENDING partial payment (caller owns the transaction and
/// has already validated the aggregate cap)
pub async fn insert(
    conn: &mut SqliteConnection,
    payment: &PartialPayment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO partial_payments
            (id, order_id, amount, method, transaction_ref, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.amount)
    .bind(&payment.method)
    .bind(&payment.transaction_ref)
    .bind(payment.status.as_db())
    .bind(payment.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<PartialPayment>, sqlx::Error> {
    let row: Option<PartialPaymentRow> =
        sqlx::query_as("SELECT * FROM partial_payments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(PartialPaymentRow::into_model).transpose()
}

pub async fn list_for_order(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Vec<PartialPayment>, sqlx::Error> {
    let rows: Vec<PartialPaymentRow> = sqlx::query_as(
        "SELECT * FROM partial_payments WHERE order_id = $1 ORDER BY created_at, rowid",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(PartialPaymentRow::into_model).collect()
}

/// Sum of PENDING + COMPLETED amounts for an order; the cap check against
/// the order total must read this inside the same transaction that inserts
pub async fn active_amount_sum(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<f64, sqlx::Error> {
    let (sum,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0.0) FROM partial_payments
         WHERE order_id = $1 AND status IN ('PENDING', 'COMPLETED')",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(sum)
}

/// Sum of COMPLETED amounts for an order
pub async fn completed_amount_sum(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<f64, sqlx::Error> {
    let (sum,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0.0) FROM partial_payments
         WHERE order_id = $1 AND status = 'COMPLETED'",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(sum)
}

/// PENDING -> COMPLETED compare-and-set
pub async fn complete(pool: &SqlitePool, id: &str, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE partial_payments SET status = 'COMPLETED', completed_at = $1
         WHERE id = $2 AND status = 'PENDING'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// COMPLETED -> REFUNDED compare-and-set
pub async fn refund(pool: &SqlitePool, id: &str, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE partial_payments SET status = 'REFUNDED', refunded_at = $1
         WHERE id = $2 AND status = 'COMPLETED'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
