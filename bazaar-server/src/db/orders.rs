//! Order repository
//!
//! Status transitions are guarded compare-and-set updates: every UPDATE
//! names the states it is legal from and reports rows_affected, so callers
//! can distinguish "transitioned" from "already there / illegal". This is
//! the sole concurrency-safety mechanism for order state (no distributed
//! lock exists).

use shared::models::{LineItem, Order, OrderStatus, PaymentStatus, ShippingAddress};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    checkout_id: String,
    customer_id: String,
    seller_id: String,
    courier_id: Option<String>,
    subtotal: f64,
    shipping_fee: f64,
    total: f64,
    status: String,
    payment_status: String,
    ship_street: String,
    ship_city: String,
    ship_state: String,
    ship_postal_code: String,
    ship_country: String,
    payment_method: String,
    created_at: i64,
    paid_at: Option<i64>,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: String,
    name: String,
    quantity: i64,
    unit_price: f64,
}

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Result<Order, sqlx::Error> {
        let status = OrderStatus::from_db(&self.status)
            .ok_or_else(|| decode_err(format!("invalid order status: {}", self.status)))?;
        let payment_status = PaymentStatus::from_db(&self.payment_status).ok_or_else(|| {
            decode_err(format!("invalid payment status: {}", self.payment_status))
        })?;
        Ok(Order {
            id: self.id,
            checkout_id: self.checkout_id,
            customer_id: self.customer_id,
            seller_id: self.seller_id,
            courier_id: self.courier_id,
            items,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            total: self.total,
            status,
            payment_status,
            address: ShippingAddress {
                street: self.ship_street,
                city: self.ship_city,
                state: self.ship_state,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            payment_method: self.payment_method,
            created_at: self.created_at,
            paid_at: self.paid_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert an order and its line items (caller owns the transaction)
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, checkout_id, customer_id, seller_id, courier_id,
            subtotal, shipping_fee, total, status, payment_status,
            ship_street, ship_city, ship_state, ship_postal_code, ship_country,
            payment_method, created_at, paid_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, $13, $14, $15, $16, $17, $18, $19)",
    )
    .bind(&order.id)
    .bind(&order.checkout_id)
    .bind(&order.customer_id)
    .bind(&order.seller_id)
    .bind(&order.courier_id)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.total)
    .bind(order.status.as_db())
    .bind(order.payment_status.as_db())
    .bind(&order.address.street)
    .bind(&order.address.city)
    .bind(&order.address.state)
    .bind(&order.address.postal_code)
    .bind(&order.address.country)
    .bind(&order.payment_method)
    .bind(order.created_at)
    .bind(order.paid_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, quantity, unit_price)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&order.id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Line items belonging to an order
pub async fn items_for(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<Vec<LineItem>, sqlx::Error> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        "SELECT product_id, name, quantity, unit_price FROM order_items
         WHERE order_id = $1 ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| LineItem {
            product_id: r.product_id,
            name: r.name,
            quantity: r.quantity,
            unit_price: r.unit_price,
        })
        .collect())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else { return Ok(None) };
    let mut conn = pool.acquire().await?;
    let items = items_for(&mut conn, id).await?;
    row.into_order(items).map(Some)
}

/// All orders created from one checkout session
pub async fn find_by_checkout(
    pool: &SqlitePool,
    checkout_id: &str,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows: Vec<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE checkout_id = $1 ORDER BY seller_id")
            .bind(checkout_id)
            .fetch_all(pool)
            .await?;
    let mut conn = pool.acquire().await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items_for(&mut conn, &row.id).await?;
        orders.push(row.into_order(items)?);
    }
    Ok(orders)
}

// ── Guarded transitions (compare-and-set) ───────────────────────────

/// PENDING/UNPAID -> CONFIRMED/PAID. Returns rows affected; 0 means the
/// order was not in the expected state (duplicate or out-of-order event).
pub async fn confirm_paid(
    conn: &mut SqliteConnection,
    order_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'CONFIRMED', payment_status = 'PAID',
            paid_at = $1, updated_at = $1
         WHERE id = $2 AND status = 'PENDING' AND payment_status = 'UNPAID'",
    )
    .bind(now)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// PENDING|CONFIRMED / UNPAID -> PAYMENT_FAILED/FAILED
pub async fn mark_payment_failed(
    pool: &SqlitePool,
    order_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'PAYMENT_FAILED', payment_status = 'FAILED', updated_at = $1
         WHERE id = $2 AND status IN ('PENDING', 'CONFIRMED') AND payment_status = 'UNPAID'",
    )
    .bind(now)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// PENDING|CONFIRMED -> CANCELLED/CANCELED (provider-side cancellation)
pub async fn mark_provider_canceled(
    pool: &SqlitePool,
    order_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'CANCELLED', payment_status = 'CANCELED', updated_at = $1
         WHERE id = $2 AND status IN ('PENDING', 'CONFIRMED')",
    )
    .bind(now)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// CONFIRMED -> SHIPPED, restricted to the owning seller
pub async fn mark_shipped(
    pool: &SqlitePool,
    order_id: &str,
    seller_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'SHIPPED', updated_at = $1
         WHERE id = $2 AND seller_id = $3 AND status = 'CONFIRMED'",
    )
    .bind(now)
    .bind(order_id)
    .bind(seller_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// SHIPPED -> DELIVERED; records the courier on first delivery
pub async fn mark_delivered(
    pool: &SqlitePool,
    order_id: &str,
    courier_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'DELIVERED', courier_id = COALESCE(courier_id, $1),
            updated_at = $2
         WHERE id = $3 AND status = 'SHIPPED'",
    )
    .bind(courier_id)
    .bind(now)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Customer cancellation, only while PENDING and UNPAID
pub async fn cancel_by_customer(
    pool: &SqlitePool,
    order_id: &str,
    customer_id: &str,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'CANCELLED', updated_at = $1
         WHERE id = $2 AND customer_id = $3 AND status = 'PENDING'
           AND payment_status = 'UNPAID'",
    )
    .bind(now)
    .bind(order_id)
    .bind(customer_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ── Reporting ───────────────────────────────────────────────────────

/// Units of a product sold in paid orders since `cutoff` (epoch millis)
pub async fn quantity_sold_since(
    pool: &SqlitePool,
    product_id: &str,
    cutoff: i64,
) -> Result<i64, sqlx::Error> {
    let (sum,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(oi.quantity), 0)
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE oi.product_id = $1
           AND o.status IN ('CONFIRMED', 'SHIPPED', 'DELIVERED')
           AND o.paid_at IS NOT NULL AND o.paid_at >= $2",
    )
    .bind(product_id)
    .bind(cutoff)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}
