//! Inventory ledger
//!
//! Sole mutation path for product stock. Every mutation and its audit row
//! commit in one transaction; stock can never go negative because the
//! decrement is a guarded UPDATE, not read-then-write.

use shared::models::{StockForecast, StockMovement, StockOperation, Urgency};
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{self, DbService};

/// Trailing window for sales velocity, in days
const SALES_WINDOW_DAYS: i64 = 90;
/// Safety stock buffer, in days of average sales
const SAFETY_BUFFER_DAYS: f64 = 7.0;
/// Horizon used when sizing a replenishment order, in days
const ORDER_HORIZON_DAYS: f64 = 30.0;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub async fn get_available_stock(db: &DbService, product_id: &str) -> AppResult<i64> {
    let mut conn = db.pool.acquire().await?;
    db::inventory::get_stock(&mut conn, product_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::InventoryNotFound).with_detail("productId", product_id)
        })
}

/// Apply one stock mutation and its audit entry atomically.
///
/// Returns `Ok(false)` when a decrement would take stock negative; the
/// caller decides whether that is an error. All other failures are raised.
pub async fn update_stock(
    db: &DbService,
    product_id: &str,
    quantity: i64,
    operation: StockOperation,
    reason: &str,
) -> AppResult<bool> {
    if quantity < 0 {
        return Err(AppError::validation("quantity must not be negative"));
    }
    let now = db::now_millis();
    let mut tx = db.pool.begin().await?;

    let before = db::inventory::get_stock(&mut *tx, product_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::InventoryNotFound).with_detail("productId", product_id)
        })?;

    let (rows, delta) = match operation {
        StockOperation::Increment => (
            db::inventory::increment(&mut *tx, product_id, quantity, now).await?,
            quantity,
        ),
        StockOperation::Decrement => (
            db::inventory::try_decrement(&mut *tx, product_id, quantity, now).await?,
            -quantity,
        ),
        StockOperation::Set => (
            db::inventory::set_stock(&mut *tx, product_id, quantity, now).await?,
            quantity - before,
        ),
    };

    if rows == 0 {
        // decrement guard refused; leave stock and audit log untouched
        tx.rollback().await?;
        tracing::warn!(
            product_id = %product_id,
            requested = quantity,
            available = before,
            "stock decrement refused, would go negative"
        );
        return Ok(false);
    }

    db::inventory::insert_movement(&mut *tx, product_id, delta, before + delta, reason, now).await?;
    tx.commit().await?;
    Ok(true)
}

/// Recent audit entries for one product, newest first
pub async fn movements(
    db: &DbService,
    product_id: &str,
    limit: i64,
) -> AppResult<Vec<StockMovement>> {
    Ok(db::inventory::movements_for(&db.pool, product_id, limit).await?)
}

/// Pure forecast math, separated from IO so the formulas are testable
/// without a database
pub fn compute_forecast(
    product_id: &str,
    current_stock: i64,
    sold_in_window: i64,
    lead_time_days: f64,
) -> StockForecast {
    let average_daily_sales = sold_in_window as f64 / SALES_WINDOW_DAYS as f64;
    // the buffer stays fractional inside the formula; only the reported
    // safety_stock is rounded up to whole units
    let safety_buffer = average_daily_sales * SAFETY_BUFFER_DAYS;
    let safety_stock = safety_buffer.ceil() as i64;
    let reorder_point = (average_daily_sales * lead_time_days + safety_buffer).ceil() as i64;
    let horizon_demand = average_daily_sales * ORDER_HORIZON_DAYS;
    let recommended_order_quantity = (horizon_demand - current_stock as f64
        + (reorder_point as f64 - horizon_demand))
        .ceil()
        .max(0.0) as i64;
    let days_until_stockout = if average_daily_sales > 0.0 {
        Some((current_stock as f64 / average_daily_sales).floor() as i64)
    } else {
        None
    };

    let urgency = match days_until_stockout {
        _ if current_stock <= 0 => Urgency::Critical,
        Some(days) if days <= 3 => Urgency::Critical,
        Some(days) if days <= 7 => Urgency::High,
        _ if current_stock <= reorder_point => Urgency::Medium,
        _ => Urgency::Low,
    };

    StockForecast {
        product_id: product_id.to_string(),
        current_stock,
        average_daily_sales,
        safety_stock,
        reorder_point,
        recommended_order_quantity,
        days_until_stockout,
        urgency,
    }
}

/// Replenishment forecast for one product
pub async fn forecast(
    db: &DbService,
    product_id: &str,
    lead_time_days: f64,
) -> AppResult<StockForecast> {
    let record = db::inventory::find_record(&db.pool, product_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::InventoryNotFound).with_detail("productId", product_id)
        })?;
    let cutoff = db::now_millis() - SALES_WINDOW_DAYS * MILLIS_PER_DAY;
    let sold = db::orders::quantity_sold_since(&db.pool, product_id, cutoff).await?;
    Ok(compute_forecast(product_id, record.stock, sold, lead_time_days))
}

/// Products at or below their reorder point, most urgent first, paginated
pub async fn low_stock_report(
    db: &DbService,
    lead_time_days: f64,
    page: i64,
    page_size: i64,
) -> AppResult<Vec<StockForecast>> {
    let cutoff = db::now_millis() - SALES_WINDOW_DAYS * MILLIS_PER_DAY;
    let mut report = Vec::new();
    for product_id in db::products::all_ids(&db.pool).await? {
        let Some(record) = db::inventory::find_record(&db.pool, &product_id).await? else {
            continue;
        };
        let sold = db::orders::quantity_sold_since(&db.pool, &product_id, cutoff).await?;
        let forecast = compute_forecast(&product_id, record.stock, sold, lead_time_days);
        if forecast.current_stock <= forecast.reorder_point {
            report.push(forecast);
        }
    }
    report.sort_by_key(|f| (f.urgency.rank(), f.product_id.clone()));

    let page = page.max(1);
    let page_size = page_size.clamp(1, 100);
    let start = ((page - 1) * page_size) as usize;
    Ok(report
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_known_scenario() {
        // 180 units over 90 days, 2.0/day; lead time 7 days
        let f = compute_forecast("p1", 10, 180, 7.0);
        assert_eq!(f.average_daily_sales, 2.0);
        assert_eq!(f.safety_stock, 14);
        assert_eq!(f.reorder_point, 28);
        assert_eq!(f.days_until_stockout, Some(5));
        // 5 days left escalates past medium
        assert_eq!(f.urgency, Urgency::High);
        assert_eq!(f.recommended_order_quantity, 18);
    }

    #[test]
    fn test_forecast_zero_sales_is_unbounded() {
        let f = compute_forecast("p1", 10, 0, 7.0);
        assert_eq!(f.average_daily_sales, 0.0);
        assert_eq!(f.days_until_stockout, None);
        assert_eq!(f.urgency, Urgency::Low);
        assert_eq!(f.recommended_order_quantity, 0);
    }

    #[test]
    fn test_forecast_zero_stock_is_critical() {
        let f = compute_forecast("p1", 0, 0, 7.0);
        assert_eq!(f.urgency, Urgency::Critical);
    }

    #[test]
    fn test_forecast_at_reorder_point_is_medium() {
        // 9 units sold in 90d, avg 0.1/day, buffer 0.7
        // safety_stock reports ceil(0.7)=1 but reorder uses the raw buffer:
        // ceil(0.7 + 0.7) = 2
        let f = compute_forecast("p1", 2, 9, 7.0);
        assert_eq!(f.safety_stock, 1);
        assert_eq!(f.reorder_point, 2);
        assert_eq!(f.days_until_stockout, Some(20));
        assert_eq!(f.urgency, Urgency::Medium);
    }

    #[tokio::test]
    async fn test_update_stock_writes_audit_atomically() {
        let db = DbService::open_in_memory().await.unwrap();
        let product = db::products::create(&db.pool, "seller-a", "Widget", 5.0)
            .await
            .unwrap();
        assert!(
            update_stock(&db, &product.id, 10, StockOperation::Increment, "restock")
                .await
                .unwrap()
        );
        assert_eq!(get_available_stock(&db, &product.id).await.unwrap(), 10);

        let log = movements(&db, &product.id, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].delta, 10);
        assert_eq!(log[0].resulting_stock, 10);
        assert_eq!(log[0].reason, "restock");
    }

    #[tokio::test]
    async fn test_decrement_below_zero_refused_without_audit() {
        let db = DbService::open_in_memory().await.unwrap();
        let product = db::products::create(&db.pool, "seller-a", "Widget", 5.0)
            .await
            .unwrap();
        update_stock(&db, &product.id, 3, StockOperation::Set, "initial")
            .await
            .unwrap();

        let ok = update_stock(&db, &product.id, 5, StockOperation::Decrement, "oversell")
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(get_available_stock(&db, &product.id).await.unwrap(), 3);
        // refused mutation leaves no audit entry
        let log = movements(&db, &product.id, 10).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_set_records_signed_delta() {
        let db = DbService::open_in_memory().await.unwrap();
        let product = db::products::create(&db.pool, "seller-a", "Widget", 5.0)
            .await
            .unwrap();
        update_stock(&db, &product.id, 10, StockOperation::Set, "initial")
            .await
            .unwrap();
        update_stock(&db, &product.id, 4, StockOperation::Set, "recount")
            .await
            .unwrap();

        let log = movements(&db, &product.id, 10).await.unwrap();
        assert_eq!(log[0].delta, -6);
        assert_eq!(log[0].resulting_stock, 4);
    }

    #[tokio::test]
    async fn test_unknown_product_errors() {
        let db = DbService::open_in_memory().await.unwrap();
        let err = get_available_stock(&db, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InventoryNotFound);
    }

    /// Seed a product, then sell `sold` units through a paid checkout so the
    /// units land in the trailing sales window
    async fn seed_with_sales(db: &DbService, name: &str, initial_stock: i64, sold: i64) -> String {
        use shared::models::{CartItem, CheckoutRequest, ShippingAddress};

        let product = db::products::create(&db.pool, "seller-a", name, 10.0)
            .await
            .unwrap();
        update_stock(db, &product.id, initial_stock, StockOperation::Set, "seed")
            .await
            .unwrap();
        if sold > 0 {
            let session = crate::checkout::checkout(
                db,
                &crate::checkout::ShippingPolicy::default(),
                "cust-1",
                CheckoutRequest {
                    items: vec![CartItem {
                        product_id: product.id.clone(),
                        quantity: sold,
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
            crate::payments::apply_payment_succeeded(db, &session.orders[0].id)
                .await
                .unwrap();
        }
        product.id
    }

    #[tokio::test]
    async fn test_low_stock_report_orders_by_urgency() {
        let db = DbService::open_in_memory().await.unwrap();
        // remaining stock after the sale / velocity:
        // 50 left at 0.1/day, reorder point 2, well stocked
        let healthy = seed_with_sales(&db, "Healthy", 59, 9).await;
        // 2 left at 0.1/day, sitting exactly at its reorder point
        let medium = seed_with_sales(&db, "Steady", 11, 9).await;
        // 10 left at 2.0/day, 5 days from stockout
        let high = seed_with_sales(&db, "Fast", 190, 180).await;
        // sold out
        let critical = seed_with_sales(&db, "Gone", 5, 5).await;

        let report = low_stock_report(&db, 7.0, 1, 50).await.unwrap();
        let ids: Vec<&str> = report.iter().map(|f| f.product_id.as_str()).collect();
        assert_eq!(ids, vec![critical.as_str(), high.as_str(), medium.as_str()]);
        assert_eq!(report[0].urgency, Urgency::Critical);
        assert_eq!(report[1].urgency, Urgency::High);
        assert_eq!(report[2].urgency, Urgency::Medium);
        // products above their reorder point stay out of the report
        assert!(!report.iter().any(|f| f.product_id == healthy));
    }

    #[tokio::test]
    async fn test_low_stock_report_pagination() {
        let db = DbService::open_in_memory().await.unwrap();
        let medium = seed_with_sales(&db, "Steady", 11, 9).await;
        let high = seed_with_sales(&db, "Fast", 190, 180).await;
        let critical = seed_with_sales(&db, "Gone", 5, 5).await;

        let page1 = low_stock_report(&db, 7.0, 1, 2).await.unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].product_id, critical);
        assert_eq!(page1[1].product_id, high);

        let page2 = low_stock_report(&db, 7.0, 2, 2).await.unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].product_id, medium);

        // page indexes below 1 clamp to the first page
        let clamped = low_stock_report(&db, 7.0, 0, 2).await.unwrap();
        assert_eq!(clamped[0].product_id, critical);
    }
}
