//! Partial Payment Model
//!
//! One installment toward an order's total. The aggregate paid amount is
//! always derived from the rows, never stored on the order.

use serde::{Deserialize, Serialize};

/// Partial payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartialPaymentStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
}

impl PartialPaymentStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
        }
    }
}

/// Partial payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialPayment {
    pub id: String,
    pub order_id: String,
    /// Amount in currency unit
    pub amount: f64,
    pub method: String,
    /// External provider transaction reference
    pub transaction_ref: Option<String>,
    pub status: PartialPaymentStatus,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub refunded_at: Option<i64>,
}

/// Order-scoped payment schedule summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub order_id: String,
    pub order_total: f64,
    /// Sum of COMPLETED partial payments
    pub total_paid: f64,
    /// Outstanding balance (never negative)
    pub remaining: f64,
    pub payments: Vec<PartialPayment>,
}
