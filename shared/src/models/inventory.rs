//! Inventory Model
//!
//! Stock is mutated only through the inventory ledger's atomic operations;
//! every mutation leaves a [`StockMovement`] audit row.

use serde::{Deserialize, Serialize};

/// Inventory record, one per product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Product reference (String ID)
    pub product_id: String,
    /// On-hand quantity, never negative
    pub stock: i64,
    pub updated_at: i64,
}

/// Stock mutation operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Increment,
    Decrement,
    Set,
}

impl StockOperation {
    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Set => "set",
        }
    }
}

/// Audit entry for one stock mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Signed change applied to stock
    pub delta: i64,
    /// Stock level after the mutation
    pub resulting_stock: i64,
    /// Why the mutation happened (e.g. the order id)
    pub reason: String,
    pub created_at: i64,
}

/// Replenishment urgency, ordered most-urgent-first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl Urgency {
    /// Sort key: lower is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Replenishment forecast for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockForecast {
    pub product_id: String,
    pub current_stock: i64,
    /// Units sold per day, averaged over the trailing 90-day window
    pub average_daily_sales: f64,
    /// Seven days of average sales, rounded up to whole units; the reorder
    /// point is derived from the unrounded buffer
    pub safety_stock: i64,
    pub reorder_point: i64,
    pub recommended_order_quantity: i64,
    /// None when average daily sales is zero (stockout unbounded)
    pub days_until_stockout: Option<i64>,
    pub urgency: Urgency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical.rank() < Urgency::High.rank());
        assert!(Urgency::High.rank() < Urgency::Medium.rank());
        assert!(Urgency::Medium.rank() < Urgency::Low.rank());
    }

    #[test]
    fn test_urgency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Urgency::Critical).unwrap(),
            "\"critical\""
        );
    }
}
