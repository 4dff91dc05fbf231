//! Return request repository
//!
//! Transitions are one-directional compare-and-set updates; there is no
//! path back from RECEIVED to APPROVED or from any terminal state.

use shared::models::{RefundMethod, ReturnRequest, ReturnStatus};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(sqlx::FromRow)]
struct ReturnRow {
    id: String,
    order_id: String,
    product_id: Option<String>,
    requested_quantity: i64,
    reason: String,
    refund_method: String,
    status: String,
    refund_amount: Option<f64>,
    approver_id: Option<String>,
    reject_reason: Option<String>,
    created_at: i64,
    approved_at: Option<i64>,
    received_at: Option<i64>,
    refunded_at: Option<i64>,
}

impl ReturnRow {
    fn into_model(self) -> Result<ReturnRequest, sqlx::Error> {
        let status = ReturnStatus::from_db(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid return status: {}", self.status).into())
        })?;
        let refund_method = RefundMethod::from_db(&self.refund_method).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid refund method: {}", self.refund_method).into())
        })?;
        Ok(ReturnRequest {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            requested_quantity: self.requested_quantity,
            reason: self.reason,
            refund_method,
            status,
            refund_amount: self.refund_amount,
            approver_id: self.approver_id,
            reject_reason: self.reject_reason,
            created_at: self.created_at,
            approved_at: self.approved_at,
            received_at: self.received_at,
            refunded_at: self.refunded_at,
        })
    }
}

pub async fn insert(pool: &SqlitePool, request: &ReturnRequest) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO return_requests
            (id, order_id, product_id, requested_quantity, reason, refund_method,
             status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&request.id)
    .bind(&request.order_id)
    .bind(&request.product_id)
    .bind(request.requested_quantity)
    .bind(&request.reason)
    .bind(request.refund_method.as_db())
    .bind(request.status.as_db())
    .bind(request.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ReturnRequest>, sqlx::Error> {
    let row: Option<ReturnRow> = sqlx::query_as("SELECT * FROM return_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(ReturnRow::into_model).transpose()
}

/// PENDING -> APPROVED, freezing the refund amount in the same statement.
/// Runs on the caller's transaction so an amount-computation failure aborts
/// the whole transition.
pub async fn approve(
    conn: &mut SqliteConnection,
    id: &str,
    refund_amount: f64,
    approver_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE return_requests SET status = 'APPROVED', refund_amount = $1,
            approver_id = $2, approved_at = $3
         WHERE id = $4 AND status = 'PENDING'",
    )
    .bind(refund_amount)
    .bind(approver_id)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// PENDING -> REJECTED
pub async fn reject(
    pool: &SqlitePool,
    id: &str,
    reject_reason: &str,
    approver_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE return_requests SET status = 'REJECTED', reject_reason = $1,
            approver_id = $2, approved_at = $3
         WHERE id = $4 AND status = 'PENDING'",
    )
    .bind(reject_reason)
    .bind(approver_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// APPROVED -> RECEIVED (caller owns the transaction; the restock runs on
/// the same one)
pub async fn mark_received(
    conn: &mut SqliteConnection,
    id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE return_requests SET status = 'RECEIVED', received_at = $1
         WHERE id = $2 AND status = 'APPROVED'",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// RECEIVED -> REFUNDED
pub async fn mark_refunded(pool: &SqlitePool, id: &str, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE return_requests SET status = 'REFUNDED', refunded_at = $1
         WHERE id = $2 AND status = 'RECEIVED'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
