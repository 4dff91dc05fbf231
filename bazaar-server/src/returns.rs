//! Return and refund workflow
//!
//! PENDING -> APPROVED -> RECEIVED -> REFUNDED, with PENDING -> REJECTED as
//! the alternate terminal. The refund amount is computed once at approval
//! from the order's own price snapshot and frozen; catalog price changes
//! after that point never move it.

use rust_decimal::Decimal;
use shared::models::{
    Order, OrderStatus, PartialPayment, PartialPaymentStatus, RefundMethod, ReturnRequest,
    ReturnStatus,
};
use shared::money::{to_decimal, to_f64};
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{self, DbService};
use crate::payments::provider::ProviderClient;

async fn find(db: &DbService, return_id: &str) -> AppResult<ReturnRequest> {
    db::returns::find_by_id(&db.pool, return_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::ReturnNotFound).with_detail("returnId", return_id)
        })
}

async fn parent_order(db: &DbService, order_id: &str) -> AppResult<Order> {
    db::orders::find_by_id(&db.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))
}

/// Customer opens a return for a delivered order. `product_id = None`
/// means a whole-order return.
pub async fn request_return(
    db: &DbService,
    customer_id: &str,
    order_id: &str,
    product_id: Option<String>,
    requested_quantity: i64,
    reason: &str,
    refund_method: RefundMethod,
) -> AppResult<ReturnRequest> {
    if reason.trim().is_empty() {
        return Err(AppError::validation("a return reason is required"));
    }
    let order = parent_order(db, order_id).await?;
    if order.customer_id != customer_id {
        return Err(AppError::forbidden("order belongs to another customer"));
    }
    if order.status != OrderStatus::Delivered {
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            format!("returns require a delivered order, not {:?}", order.status),
        ));
    }

    if let Some(product_id) = &product_id {
        let Some(item) = order.items.iter().find(|i| &i.product_id == product_id) else {
            return Err(AppError::with_message(
                ErrorCode::ProductNotFound,
                "product is not part of this order",
            ));
        };
        if requested_quantity < 1 || requested_quantity > item.quantity {
            return Err(AppError::new(ErrorCode::ReturnQuantityInvalid)
                .with_detail("requested", requested_quantity)
                .with_detail("ordered", item.quantity));
        }
    }

    let request = ReturnRequest {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        product_id,
        requested_quantity,
        reason: reason.to_string(),
        refund_method,
        status: ReturnStatus::Pending,
        refund_amount: None,
        approver_id: None,
        reject_reason: None,
        created_at: db::now_millis(),
        approved_at: None,
        received_at: None,
        refunded_at: None,
    };
    db::returns::insert(&db.pool, &request).await?;
    tracing::info!(
        return_id = %request.id,
        order_id = %order_id,
        "return requested"
    );
    Ok(request)
}

/// Approve a pending return, computing and freezing the refund amount.
///
/// The amount comes from the order's line-item snapshot (or the order total
/// for whole-order returns), so it reflects what the customer actually
/// paid. Computation and transition share a transaction; a failure leaves
/// the return PENDING with no amount set.
pub async fn approve(db: &DbService, return_id: &str, approver_id: &str) -> AppResult<ReturnRequest> {
    let request = find(db, return_id).await?;
    let order = parent_order(db, &request.order_id).await?;

    let refund_amount = match &request.product_id {
        Some(product_id) => {
            let item = order
                .items
                .iter()
                .find(|i| &i.product_id == product_id)
                .ok_or_else(|| {
                    AppError::internal("return references a product missing from its order")
                })?;
            to_f64(to_decimal(item.unit_price) * Decimal::from(request.requested_quantity))
        }
        None => order.total,
    };

    let mut tx = db.pool.begin().await?;
    let rows =
        db::returns::approve(&mut *tx, return_id, refund_amount, approver_id, db::now_millis())
            .await?;
    if rows == 0 {
        tx.rollback().await?;
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            format!("only pending returns can be approved, not {:?}", request.status),
        ));
    }
    tx.commit().await?;

    tracing::info!(return_id = %return_id, refund_amount, "return approved");
    find(db, return_id).await
}

/// Reject a pending return. The reason is mandatory.
pub async fn reject(
    db: &DbService,
    return_id: &str,
    reject_reason: &str,
    approver_id: &str,
) -> AppResult<ReturnRequest> {
    if reject_reason.trim().is_empty() {
        return Err(AppError::validation("a rejection reason is required"));
    }
    let request = find(db, return_id).await?;
    let rows =
        db::returns::reject(&db.pool, return_id, reject_reason, approver_id, db::now_millis())
            .await?;
    if rows == 0 {
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            format!("only pending returns can be rejected, not {:?}", request.status),
        ));
    }
    find(db, return_id).await
}

/// Warehouse confirms physical receipt; items go back into stock in the
/// same transaction as the state transition.
pub async fn mark_received(db: &DbService, return_id: &str) -> AppResult<ReturnRequest> {
    let request = find(db, return_id).await?;
    let order = parent_order(db, &request.order_id).await?;
    let now = db::now_millis();

    let restock: Vec<(String, i64)> = match &request.product_id {
        Some(product_id) => vec![(product_id.clone(), request.requested_quantity)],
        None => order
            .items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect(),
    };

    let mut tx = db.pool.begin().await?;
    if db::returns::mark_received(&mut *tx, return_id, now).await? == 0 {
        tx.rollback().await?;
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            format!("only approved returns can be received, not {:?}", request.status),
        ));
    }
    let reason = format!("return {return_id}");
    for (product_id, quantity) in restock {
        db::inventory::increment(&mut *tx, &product_id, quantity, now).await?;
        let resulting = db::inventory::get_stock(&mut *tx, &product_id)
            .await?
            .unwrap_or(quantity);
        db::inventory::insert_movement(&mut *tx, &product_id, quantity, resulting, &reason, now)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(return_id = %return_id, "return received, stock restored");
    find(db, return_id).await
}

/// Issue the refund for a received return. Decoupled from receipt because
/// warehouse and finance are different actors.
pub async fn issue_refund(
    db: &DbService,
    return_id: &str,
    provider: Option<&ProviderClient>,
) -> AppResult<ReturnRequest> {
    let request = find(db, return_id).await?;
    if request.status != ReturnStatus::Received {
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            format!("only received returns can be refunded, not {:?}", request.status),
        ));
    }
    let amount = request.refund_amount.ok_or_else(|| {
        AppError::internal("received return has no frozen refund amount")
    })?;

    // store-credit refunds settle internally; original-method refunds go
    // through the provider first so a provider failure leaves the return
    // RECEIVED and retryable
    if request.refund_method == RefundMethod::Original {
        if let Some(provider) = provider {
            let payments =
                db::partial_payments::list_for_order(&db.pool, &request.order_id).await?;
            let reference = provider_reference(&request.order_id, &payments);
            provider.refund(&reference, amount).await?;
        }
    }

    if db::returns::mark_refunded(&db.pool, return_id, db::now_millis()).await? == 0 {
        return Err(AppError::invalid_state(
            ErrorCode::ReturnStateInvalid,
            "return left the RECEIVED state concurrently",
        ));
    }
    tracing::info!(return_id = %return_id, amount, "refund issued");
    find(db, return_id).await
}

/// Provider-side reference for the original payment: the latest completed
/// installment that carries a transaction ref, or the order id when the
/// order was settled through the webhook flow (the provider keys those
/// payments by the order id in their metadata).
fn provider_reference(order_id: &str, payments: &[PartialPayment]) -> String {
    payments
        .iter()
        .filter(|p| p.status == PartialPaymentStatus::Completed)
        .rev()
        .find_map(|p| p.transaction_ref.clone())
        .unwrap_or_else(|| order_id.to_string())
}
