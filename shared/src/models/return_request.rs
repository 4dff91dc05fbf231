//! Return Request Model
//!
//! One-directional workflow: PENDING -> APPROVED -> RECEIVED -> REFUNDED,
//! with PENDING -> REJECTED as the alternate terminal. `refund_amount` is
//! computed and frozen at approval; later price changes never touch it.

use serde::{Deserialize, Serialize};

/// Return request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Received,
    Refunded,
}

impl ReturnStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "RECEIVED" => Some(Self::Received),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Received => "RECEIVED",
            Self::Refunded => "REFUNDED",
        }
    }
}

/// How the refund is paid out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    /// Back to the original payment instrument via the provider
    #[default]
    Original,
    StoreCredit,
}

impl RefundMethod {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "original" => Some(Self::Original),
            "store_credit" => Some(Self::StoreCredit),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::StoreCredit => "store_credit",
        }
    }
}

/// Return request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: String,
    pub order_id: String,
    /// Item-level return when set; whole-order return when None
    pub product_id: Option<String>,
    pub requested_quantity: i64,
    pub reason: String,
    pub refund_method: RefundMethod,
    pub status: ReturnStatus,
    /// Frozen at approval time; immutable thereafter
    pub refund_amount: Option<f64>,
    pub approver_id: Option<String>,
    pub reject_reason: Option<String>,
    pub created_at: i64,
    pub approved_at: Option<i64>,
    pub received_at: Option<i64>,
    pub refunded_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for s in [
            ReturnStatus::Pending,
            ReturnStatus::Approved,
            ReturnStatus::Rejected,
            ReturnStatus::Received,
            ReturnStatus::Refunded,
        ] {
            assert_eq!(ReturnStatus::from_db(s.as_db()), Some(s));
        }
    }

    #[test]
    fn test_refund_method_db_roundtrip() {
        assert_eq!(
            RefundMethod::from_db(RefundMethod::Original.as_db()),
            Some(RefundMethod::Original)
        );
        assert_eq!(
            RefundMethod::from_db(RefundMethod::StoreCredit.as_db()),
            Some(RefundMethod::StoreCredit)
        );
    }
}
