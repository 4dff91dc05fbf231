//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `price` is the live catalog price; orders snapshot it into their line
/// items at checkout time, so later edits never alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    /// Seller reference (String ID)
    pub seller_id: String,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    pub is_active: bool,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    /// Initial on-hand stock
    #[serde(default)]
    pub initial_stock: i64,
}
