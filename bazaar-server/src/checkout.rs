//! Checkout: split a mixed-seller cart into per-seller orders
//!
//! Each resulting order is owned by exactly one seller and carries its own
//! lifecycle from here on. The checkout session only groups them for the
//! customer-facing response.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{
    CheckoutRequest, CheckoutSession, LineItem, Order, OrderStatus, PaymentStatus, Product,
};
use shared::money::{to_decimal, to_f64};
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{self, DbService};

/// Shipping fee policy, applied per seller order
#[derive(Debug, Clone)]
pub struct ShippingPolicy {
    /// Subtotal at or above which shipping is free
    pub free_shipping_floor: f64,
    pub flat_fee: f64,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_floor: 50.0,
            flat_fee: 5.0,
        }
    }
}

impl ShippingPolicy {
    /// Fee for one seller order given its item subtotal
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= to_decimal(self.free_shipping_floor) {
            Decimal::ZERO
        } else {
            to_decimal(self.flat_fee)
        }
    }
}

/// Split the cart by seller, price every line against the live catalog,
/// verify availability, and persist all resulting orders atomically.
///
/// Stock is NOT reserved here; the decrement happens when payment is
/// confirmed. A concurrent checkout can therefore still win the stock.
pub async fn checkout(
    db: &DbService,
    policy: &ShippingPolicy,
    customer_id: &str,
    request: CheckoutRequest,
) -> AppResult<CheckoutSession> {
    if request.items.is_empty() {
        return Err(AppError::validation("cart must contain at least one item"));
    }
    request.address.validate()?;

    // Merge duplicate product lines before validation so "2 + 3 of X" is
    // treated the same as "5 of X"
    let mut quantities: BTreeMap<String, i64> = BTreeMap::new();
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(AppError::validation(format!(
                "quantity must be positive for product {}",
                item.product_id
            )));
        }
        *quantities.entry(item.product_id.clone()).or_insert(0) += item.quantity;
    }

    // Snapshot catalog prices and group lines by seller. BTreeMap keeps
    // seller order deterministic.
    let mut by_seller: BTreeMap<String, Vec<(Product, i64)>> = BTreeMap::new();
    for (product_id, quantity) in &quantities {
        let product = db::products::find_active_by_id(&db.pool, product_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("productId", product_id.as_str())
            })?;
        by_seller
            .entry(product.seller_id.clone())
            .or_default()
            .push((product, *quantity));
    }

    // Availability check is advisory only (read, not reserve)
    let mut conn = db.pool.acquire().await?;
    for (product_id, quantity) in &quantities {
        let stock = db::inventory::get_stock(&mut conn, product_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::InventoryNotFound).with_detail("productId", product_id.as_str())
            })?;
        if stock < *quantity {
            return Err(AppError::insufficient_stock(product_id)
                .with_detail("requested", *quantity)
                .with_detail("available", stock));
        }
    }
    drop(conn);

    let checkout_id = uuid::Uuid::new_v4().to_string();
    let now = db::now_millis();
    let mut orders = Vec::with_capacity(by_seller.len());
    let mut grand_total = Decimal::ZERO;

    for (seller_id, lines) in by_seller {
        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = Decimal::ZERO;
        for (product, quantity) in lines {
            subtotal += to_decimal(product.price) * Decimal::from(quantity);
            items.push(LineItem {
                product_id: product.id,
                name: product.name,
                quantity,
                unit_price: product.price,
            });
        }
        let shipping = policy.fee_for(subtotal);
        let total = subtotal + shipping;
        grand_total += total;

        orders.push(Order {
            id: uuid::Uuid::new_v4().to_string(),
            checkout_id: checkout_id.clone(),
            customer_id: customer_id.to_string(),
            seller_id,
            courier_id: None,
            items,
            subtotal: to_f64(subtotal),
            shipping_fee: to_f64(shipping),
            total: to_f64(total),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            address: request.address.clone(),
            payment_method: request.payment_method.clone(),
            created_at: now,
            paid_at: None,
            updated_at: now,
        });
    }

    // All sub-orders land together or not at all
    let mut tx = db.pool.begin().await?;
    for order in &orders {
        db::orders::insert(&mut *tx, order).await?;
    }
    tx.commit().await?;

    tracing::info!(
        checkout_id = %checkout_id,
        customer_id = %customer_id,
        orders = orders.len(),
        "checkout split into per-seller orders"
    );

    Ok(CheckoutSession {
        id: checkout_id,
        customer_id: customer_id.to_string(),
        grand_total: to_f64(grand_total),
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CartItem, ShippingAddress};

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
        }
    }

    fn request(items: Vec<CartItem>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            address: address(),
            payment_method: "card".into(),
        }
    }

    async fn seed_product(db: &DbService, seller: &str, name: &str, price: f64, stock: i64) -> String {
        let product = db::products::create(&db.pool, seller, name, price)
            .await
            .unwrap();
        let mut conn = db.pool.acquire().await.unwrap();
        db::inventory::set_stock(&mut conn, &product.id, stock, db::now_millis())
            .await
            .unwrap();
        product.id
    }

    #[tokio::test]
    async fn test_splits_cart_by_seller() {
        let db = DbService::open_in_memory().await.unwrap();
        let a1 = seed_product(&db, "seller-a", "Keyboard", 30.0, 10).await;
        let a2 = seed_product(&db, "seller-a", "Mouse", 25.0, 10).await;
        let b1 = seed_product(&db, "seller-b", "Desk", 120.0, 5).await;

        let session = checkout(
            &db,
            &ShippingPolicy::default(),
            "cust-1",
            request(vec![
                CartItem { product_id: a1, quantity: 1 },
                CartItem { product_id: a2, quantity: 1 },
                CartItem { product_id: b1, quantity: 1 },
            ]),
        )
        .await
        .unwrap();

        assert_eq!(session.orders.len(), 2);
        let order_a = session.orders.iter().find(|o| o.seller_id == "seller-a").unwrap();
        let order_b = session.orders.iter().find(|o| o.seller_id == "seller-b").unwrap();

        // seller A: 55.00 subtotal, above the 50.00 floor, ships free
        assert_eq!(order_a.subtotal, 55.0);
        assert_eq!(order_a.shipping_fee, 0.0);
        assert_eq!(order_a.total, 55.0);
        // seller B: 120.00 subtotal, also free
        assert_eq!(order_b.shipping_fee, 0.0);
        assert_eq!(session.grand_total, 175.0);
        assert_eq!(order_a.status, OrderStatus::Pending);
        assert_eq!(order_a.payment_status, PaymentStatus::Unpaid);
        assert!(order_a.totals_consistent());
        assert!(order_b.totals_consistent());
    }

    #[tokio::test]
    async fn test_flat_fee_below_floor() {
        let db = DbService::open_in_memory().await.unwrap();
        let p = seed_product(&db, "seller-a", "Cable", 9.99, 10).await;

        let session = checkout(
            &db,
            &ShippingPolicy::default(),
            "cust-1",
            request(vec![CartItem { product_id: p, quantity: 2 }]),
        )
        .await
        .unwrap();

        let order = &session.orders[0];
        assert_eq!(order.subtotal, 19.98);
        assert_eq!(order.shipping_fee, 5.0);
        assert_eq!(order.total, 24.98);
        assert!(order.totals_consistent());
        assert_eq!(order.items[0].total(), 19.98);
    }

    #[tokio::test]
    async fn test_duplicate_lines_merge() {
        let db = DbService::open_in_memory().await.unwrap();
        let p = seed_product(&db, "seller-a", "Cable", 10.0, 10).await;

        let session = checkout(
            &db,
            &ShippingPolicy::default(),
            "cust-1",
            request(vec![
                CartItem { product_id: p.clone(), quantity: 2 },
                CartItem { product_id: p, quantity: 3 },
            ]),
        )
        .await
        .unwrap();

        assert_eq!(session.orders[0].items.len(), 1);
        assert_eq!(session.orders[0].items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_insufficient_stock_fails_whole_checkout() {
        let db = DbService::open_in_memory().await.unwrap();
        let ok = seed_product(&db, "seller-a", "Keyboard", 30.0, 10).await;
        let scarce = seed_product(&db, "seller-b", "Desk", 120.0, 1).await;

        let err = checkout(
            &db,
            &ShippingPolicy::default(),
            "cust-1",
            request(vec![
                CartItem { product_id: ok, quantity: 1 },
                CartItem { product_id: scarce, quantity: 2 },
            ]),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        // nothing persisted
        let mut conn = db.pool.acquire().await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = DbService::open_in_memory().await.unwrap();
        let err = checkout(&db, &ShippingPolicy::default(), "cust-1", request(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = DbService::open_in_memory().await.unwrap();
        let err = checkout(
            &db,
            &ShippingPolicy::default(),
            "cust-1",
            request(vec![CartItem { product_id: "missing".into(), quantity: 1 }]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }
}
