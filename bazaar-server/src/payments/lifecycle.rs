//! Post-payment order lifecycle
//!
//! Ship, deliver and cancel are guarded transitions; when the CAS misses we
//! re-read the order to report the precise reason instead of a generic
//! conflict.

use shared::models::Order;
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{self, DbService};

async fn load(db: &DbService, order_id: &str) -> AppResult<Order> {
    db::orders::find_by_id(&db.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))
}

/// Seller marks a confirmed order as shipped
pub async fn mark_shipped(db: &DbService, order_id: &str, seller_id: &str) -> AppResult<Order> {
    let rows = db::orders::mark_shipped(&db.pool, order_id, seller_id, db::now_millis()).await?;
    if rows == 0 {
        let order = load(db, order_id).await?;
        if order.seller_id != seller_id {
            return Err(AppError::forbidden("order belongs to another seller"));
        }
        return Err(AppError::invalid_state(
            ErrorCode::OrderStateInvalid,
            format!("cannot ship order in state {:?}", order.status),
        ));
    }
    tracing::info!(order_id = %order_id, seller_id = %seller_id, "order shipped");
    load(db, order_id).await
}

/// Courier marks a shipped order as delivered
pub async fn mark_delivered(db: &DbService, order_id: &str, courier_id: &str) -> AppResult<Order> {
    let rows = db::orders::mark_delivered(&db.pool, order_id, courier_id, db::now_millis()).await?;
    if rows == 0 {
        let order = load(db, order_id).await?;
        return Err(AppError::invalid_state(
            ErrorCode::OrderStateInvalid,
            format!("cannot deliver order in state {:?}", order.status),
        ));
    }
    tracing::info!(order_id = %order_id, courier_id = %courier_id, "order delivered");
    load(db, order_id).await
}

/// Customer cancels their own order, only while still pending and unpaid
pub async fn cancel_order(db: &DbService, order_id: &str, customer_id: &str) -> AppResult<Order> {
    let rows =
        db::orders::cancel_by_customer(&db.pool, order_id, customer_id, db::now_millis()).await?;
    if rows == 0 {
        let order = load(db, order_id).await?;
        if order.customer_id != customer_id {
            return Err(AppError::forbidden("order belongs to another customer"));
        }
        if order.payment_status == shared::models::PaymentStatus::Paid {
            return Err(AppError::with_message(
                ErrorCode::OrderAlreadyPaid,
                "paid orders are cancelled through the return workflow",
            ));
        }
        return Err(AppError::invalid_state(
            ErrorCode::OrderNotCancellable,
            format!("cannot cancel order in state {:?}", order.status),
        ));
    }
    tracing::info!(order_id = %order_id, customer_id = %customer_id, "order cancelled by customer");
    load(db, order_id).await
}
