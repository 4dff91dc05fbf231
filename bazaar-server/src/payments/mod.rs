//! Payment reconciliation
//!
//! Applies provider payment events to the dual state axes (order status,
//! payment status). The persisted payment status is the idempotency token:
//! each transition is a guarded UPDATE that no-ops when the order already
//! left the expected state, so replayed events change nothing.

pub mod lifecycle;
pub mod provider;
pub mod webhook;

use shared::AppResult;

use crate::db::{self, DbService};

/// Reconcile a `payment_succeeded` event.
///
/// Confirms the order and decrements stock for every line item in one
/// transaction. Returns `Ok(false)` when the order was not PENDING/UNPAID
/// (duplicate delivery or a state race); nothing is touched in that case.
///
/// A line item whose decrement fails does not block its siblings; the
/// shortfall is logged with order and product ids for manual reconciliation.
pub async fn apply_payment_succeeded(db: &DbService, order_id: &str) -> AppResult<bool> {
    let now = db::now_millis();
    let mut tx = db.pool.begin().await?;

    if db::orders::confirm_paid(&mut *tx, order_id, now).await? == 0 {
        tx.rollback().await?;
        tracing::info!(order_id = %order_id, "payment_succeeded ignored, order not awaiting payment");
        return Ok(false);
    }

    let items = db::orders::items_for(&mut *tx, order_id).await?;
    let reason = format!("order {order_id}");
    for item in &items {
        match db::inventory::try_decrement(&mut *tx, &item.product_id, item.quantity, now).await {
            Ok(0) => {
                tracing::error!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "stock decrement refused on paid order, needs manual reconciliation"
                );
            }
            Ok(_) => {
                let resulting = db::inventory::get_stock(&mut *tx, &item.product_id)
                    .await?
                    .unwrap_or(0);
                db::inventory::insert_movement(
                    &mut *tx,
                    &item.product_id,
                    -item.quantity,
                    resulting,
                    &reason,
                    now,
                )
                .await?;
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    error = %e,
                    "stock decrement failed on paid order, needs manual reconciliation"
                );
            }
        }
    }

    tx.commit().await?;
    tracing::info!(order_id = %order_id, "order confirmed, payment reconciled");
    Ok(true)
}

/// Reconcile a `payment_failed` event. Idempotent; `Ok(false)` when the
/// order already left the UNPAID state.
pub async fn apply_payment_failed(db: &DbService, order_id: &str) -> AppResult<bool> {
    let rows = db::orders::mark_payment_failed(&db.pool, order_id, db::now_millis()).await?;
    if rows == 0 {
        tracing::info!(order_id = %order_id, "payment_failed ignored, order not awaiting payment");
    }
    Ok(rows > 0)
}

/// Reconcile a `payment_canceled` event. Idempotent.
pub async fn apply_payment_canceled(db: &DbService, order_id: &str) -> AppResult<bool> {
    let rows = db::orders::mark_provider_canceled(&db.pool, order_id, db::now_millis()).await?;
    if rows == 0 {
        tracing::info!(order_id = %order_id, "payment_canceled ignored, order already settled");
    }
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        CartItem, CheckoutRequest, Order, OrderStatus, PaymentStatus, ShippingAddress,
        StockOperation,
    };

    async fn seed_order(db: &DbService, quantity: i64, stock: i64) -> (String, Order) {
        let product = db::products::create(&db.pool, "seller-a", "Widget", 10.0)
            .await
            .unwrap();
        crate::inventory::update_stock(db, &product.id, stock, StockOperation::Set, "seed")
            .await
            .unwrap();
        let session = crate::checkout::checkout(
            db,
            &crate::checkout::ShippingPolicy::default(),
            "cust-1",
            CheckoutRequest {
                items: vec![CartItem {
                    product_id: product.id.clone(),
                    quantity,
                }],
                address: ShippingAddress {
                    street: "1 Main St".into(),
                    city: "Springfield".into(),
                    state: "IL".into(),
                    postal_code: "62701".into(),
                    country: "US".into(),
                },
                payment_method: "card".into(),
            },
        )
        .await
        .unwrap();
        (product.id, session.orders.into_iter().next().unwrap())
    }

    #[tokio::test]
    async fn test_succeeded_confirms_and_decrements() {
        let db = DbService::open_in_memory().await.unwrap();
        let (product_id, order) = seed_order(&db, 3, 5).await;

        assert!(apply_payment_succeeded(&db, &order.id).await.unwrap());

        let order = db::orders::find_by_id(&db.pool, &order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(order.paid_at.is_some());
        assert_eq!(
            crate::inventory::get_available_stock(&db, &product_id).await.unwrap(),
            2
        );
        let log = crate::inventory::movements(&db, &product_id, 10).await.unwrap();
        assert!(log[0].reason.contains(&order.id));
    }

    #[tokio::test]
    async fn test_succeeded_is_idempotent() {
        let db = DbService::open_in_memory().await.unwrap();
        let (product_id, order) = seed_order(&db, 3, 5).await;

        assert!(apply_payment_succeeded(&db, &order.id).await.unwrap());
        // duplicate delivery of the same event
        assert!(!apply_payment_succeeded(&db, &order.id).await.unwrap());

        assert_eq!(
            crate::inventory::get_available_stock(&db, &product_id).await.unwrap(),
            2
        );
        let log = crate::inventory::movements(&db, &product_id, 10).await.unwrap();
        assert_eq!(log.iter().filter(|m| m.delta == -3).count(), 1);
    }

    #[tokio::test]
    async fn test_succeeded_with_shortfall_still_confirms() {
        let db = DbService::open_in_memory().await.unwrap();
        // checkout saw 5 in stock but a concurrent sale drained it
        let (product_id, order) = seed_order(&db, 3, 5).await;
        crate::inventory::update_stock(&db, &product_id, 1, StockOperation::Set, "drain")
            .await
            .unwrap();

        assert!(apply_payment_succeeded(&db, &order.id).await.unwrap());

        let order = db::orders::find_by_id(&db.pool, &order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        // refused decrement leaves stock as-is, never negative
        assert_eq!(
            crate::inventory::get_available_stock(&db, &product_id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_marks_both_axes() {
        let db = DbService::open_in_memory().await.unwrap();
        let (_, order) = seed_order(&db, 1, 5).await;

        assert!(apply_payment_failed(&db, &order.id).await.unwrap());
        let order = db::orders::find_by_id(&db.pool, &order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_failed_after_success_is_noop() {
        let db = DbService::open_in_memory().await.unwrap();
        let (_, order) = seed_order(&db, 1, 5).await;

        assert!(apply_payment_succeeded(&db, &order.id).await.unwrap());
        // out-of-order failed event must not clobber the paid state
        assert!(!apply_payment_failed(&db, &order.id).await.unwrap());
        let order = db::orders::find_by_id(&db.pool, &order.id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_canceled_sets_both_axes() {
        let db = DbService::open_in_memory().await.unwrap();
        let (_, order) = seed_order(&db, 1, 5).await;

        assert!(apply_payment_canceled(&db, &order.id).await.unwrap());
        let order = db::orders::find_by_id(&db.pool, &order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Canceled);
    }
}
