//! Order Model
//!
//! One order per seller per checkout. Order lifecycle and payment lifecycle
//! are tracked on two independent axes (`status`, `payment_status`); legal
//! combinations are enforced at the transition boundary, not encoded as a
//! single cross-product enum.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::money::{line_total, to_decimal, to_f64};

/// Order status axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    PaymentFailed,
}

impl OrderStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            "PAYMENT_FAILED" => Some(Self::PaymentFailed),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::PaymentFailed => "PAYMENT_FAILED",
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment status axis (independent from [`OrderStatus`])
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
    Refunded,
    /// Cancelled on the provider side (not an order cancellation)
    Canceled,
}

impl PaymentStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(Self::Unpaid),
            "PAID" => Some(Self::Paid),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
            Self::Canceled => "CANCELED",
        }
    }
}

/// Shipping address snapshot
///
/// Copied into the order at checkout; never a live reference to a profile
/// address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Validate that all required fields are non-empty
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(
                    AppError::validation(format!("{name} must not be empty"))
                        .with_detail("field", name),
                );
            }
        }
        Ok(())
    }
}

/// Order line item
///
/// `unit_price` and `name` are snapshots captured at order time; product
/// edits never alter them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    /// Unit price in currency unit, captured at order time
    pub unit_price: f64,
}

impl LineItem {
    /// Line total (unit price x quantity), decimal-rounded
    pub fn total(&self) -> f64 {
        line_total(self.unit_price, self.quantity)
    }
}

/// Order entity (one seller's portion of a multi-seller checkout)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Checkout session this order was split from
    pub checkout_id: String,
    pub customer_id: String,
    pub seller_id: String,
    pub courier_id: Option<String>,
    pub items: Vec<LineItem>,
    /// Sum of line totals in currency unit
    pub subtotal: f64,
    /// Shipping cost in currency unit
    pub shipping_fee: f64,
    /// Total amount = subtotal + shipping, fixed at creation
    pub total: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub address: ShippingAddress,
    pub payment_method: String,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
    /// Payment confirmation timestamp (epoch millis)
    pub paid_at: Option<i64>,
    pub updated_at: i64,
}

impl Order {
    /// Check the `total == subtotal + shipping` invariant
    pub fn totals_consistent(&self) -> bool {
        let expected = to_decimal(self.subtotal) + to_decimal(self.shipping_fee);
        to_f64(expected) == self.total
    }
}
