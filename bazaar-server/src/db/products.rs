//! Product repository

use shared::models::Product;
use sqlx::SqlitePool;

use super::now_millis;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    seller_id: String,
    name: String,
    price: f64,
    is_active: bool,
    created_at: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            seller_id: r.seller_id,
            name: r.name,
            price: r.price,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

/// Create a product together with its (empty) inventory record.
///
/// Every product has exactly one inventory row, so ledger lookups never have
/// to distinguish "no record" from "zero stock".
pub async fn create(
    pool: &SqlitePool,
    seller_id: &str,
    name: &str,
    price: f64,
) -> Result<Product, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_millis();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO products (id, seller_id, name, price, is_active, created_at)
         VALUES ($1, $2, $3, $4, 1, $5)",
    )
    .bind(&id)
    .bind(seller_id)
    .bind(name)
    .bind(price)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO inventory (product_id, stock, updated_at) VALUES ($1, 0, $2)")
        .bind(&id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Product {
        id,
        seller_id: seller_id.to_string(),
        name: name.to_string(),
        price,
        is_active: true,
        created_at: now,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Product>, sqlx::Error> {
    let row: Option<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Product::from))
}

pub async fn find_active_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    let row: Option<ProductRow> =
        sqlx::query_as("SELECT * FROM products WHERE id = $1 AND is_active = 1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Product::from))
}

pub async fn update_price(pool: &SqlitePool, id: &str, price: f64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET price = $1 WHERE id = $2")
        .bind(price)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All product ids that have an inventory record (admin reporting)
pub async fn all_ids(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM products ORDER BY created_at")
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}
