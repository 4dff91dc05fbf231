//! Partial payment ledger
//!
//! Installments toward one order's total. The aggregate of PENDING and
//! COMPLETED installments can never exceed the order total; the cap check
//! and the insert share a transaction so concurrent creates cannot both
//! squeeze under the cap.

use rust_decimal::Decimal;
use shared::models::{Order, PartialPayment, PartialPaymentStatus, PaymentSchedule, PaymentStatus};
use shared::money::{MONEY_TOLERANCE, round_money, to_decimal, to_f64};
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{self, DbService};

async fn owned_order(db: &DbService, order_id: &str, customer_id: &str) -> AppResult<Order> {
    let order = db::orders::find_by_id(&db.pool, order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id))?;
    if order.customer_id != customer_id {
        return Err(AppError::forbidden("order belongs to another customer"));
    }
    Ok(order)
}

/// Record a new PENDING installment against an order
pub async fn create(
    db: &DbService,
    customer_id: &str,
    order_id: &str,
    amount: f64,
    method: &str,
    transaction_ref: Option<String>,
) -> AppResult<PartialPayment> {
    if amount <= 0.0 {
        return Err(AppError::validation("amount must be positive"));
    }
    let order = owned_order(db, order_id, customer_id).await?;
    if order.payment_status != PaymentStatus::Unpaid {
        return Err(AppError::invalid_state(
            ErrorCode::PaymentStateInvalid,
            format!(
                "order payment status is {:?}, installments are closed",
                order.payment_status
            ),
        ));
    }

    let payment = PartialPayment {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        amount,
        method: method.to_string(),
        transaction_ref,
        status: PartialPaymentStatus::Pending,
        created_at: db::now_millis(),
        completed_at: None,
        refunded_at: None,
    };

    // cap check and insert are one transaction; two concurrent creates
    // serialize here
    let mut tx = db.pool.begin().await?;
    let active = to_decimal(db::partial_payments::active_amount_sum(&mut *tx, order_id).await?);
    // strict cap; rounding both sides to cents keeps f64 dust from either
    // leaking past the total or rejecting an exact fill
    if round_money(active + to_decimal(amount)) > round_money(to_decimal(order.total)) {
        tx.rollback().await?;
        return Err(AppError::new(ErrorCode::PaymentExceedsTotal)
            .with_detail("orderTotal", order.total)
            .with_detail("alreadyScheduled", to_f64(active))
            .with_detail("requested", amount));
    }
    db::partial_payments::insert(&mut *tx, &payment).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        partial_payment_id = %payment.id,
        amount,
        "partial payment recorded"
    );
    Ok(payment)
}

/// Mark an installment COMPLETED.
///
/// Idempotent: completing an already-completed installment returns it
/// unchanged. When the completed sum covers the order total the order is
/// confirmed through the normal payment path.
pub async fn complete(
    db: &DbService,
    customer_id: &str,
    partial_payment_id: &str,
) -> AppResult<PartialPayment> {
    let payment = find(db, partial_payment_id).await?;
    let order = owned_order(db, &payment.order_id, customer_id).await?;

    match payment.status {
        PartialPaymentStatus::Pending => {}
        PartialPaymentStatus::Completed => return Ok(payment),
        PartialPaymentStatus::Refunded => {
            return Err(AppError::invalid_state(
                ErrorCode::PaymentStateInvalid,
                "refunded installments cannot be completed",
            ));
        }
    }

    if db::partial_payments::complete(&db.pool, partial_payment_id, db::now_millis()).await? == 0 {
        // lost a race; whoever won already completed or refunded it
        return find(db, partial_payment_id).await;
    }

    let mut conn = db.pool.acquire().await?;
    let paid = db::partial_payments::completed_amount_sum(&mut conn, &payment.order_id).await?;
    drop(conn);
    if to_decimal(paid) + MONEY_TOLERANCE >= to_decimal(order.total) {
        let confirmed = crate::payments::apply_payment_succeeded(db, &payment.order_id).await?;
        tracing::info!(
            order_id = %payment.order_id,
            total_paid = paid,
            confirmed,
            "installments cover order total"
        );
    }

    find(db, partial_payment_id).await
}

/// Refund a COMPLETED installment
pub async fn refund(
    db: &DbService,
    customer_id: &str,
    partial_payment_id: &str,
) -> AppResult<PartialPayment> {
    let payment = find(db, partial_payment_id).await?;
    owned_order(db, &payment.order_id, customer_id).await?;

    if db::partial_payments::refund(&db.pool, partial_payment_id, db::now_millis()).await? == 0 {
        return Err(AppError::invalid_state(
            ErrorCode::PaymentStateInvalid,
            format!("only completed installments can be refunded, not {:?}", payment.status),
        ));
    }
    tracing::info!(
        order_id = %payment.order_id,
        partial_payment_id = %partial_payment_id,
        "partial payment refunded"
    );
    find(db, partial_payment_id).await
}

/// Balance and installment schedule for one order
pub async fn status(
    db: &DbService,
    customer_id: &str,
    order_id: &str,
) -> AppResult<PaymentSchedule> {
    let order = owned_order(db, order_id, customer_id).await?;
    let payments = db::partial_payments::list_for_order(&db.pool, order_id).await?;

    let total_paid: Decimal = payments
        .iter()
        .filter(|p| p.status == PartialPaymentStatus::Completed)
        .map(|p| to_decimal(p.amount))
        .sum();
    let remaining = (to_decimal(order.total) - total_paid).max(Decimal::ZERO);

    Ok(PaymentSchedule {
        order_id: order_id.to_string(),
        order_total: order.total,
        total_paid: to_f64(total_paid),
        remaining: to_f64(remaining),
        payments,
    })
}

async fn find(db: &DbService, id: &str) -> AppResult<PartialPayment> {
    db::partial_payments::find_by_id(&db.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PaymentNotFound).with_detail("partialPaymentId", id)
        })
}
