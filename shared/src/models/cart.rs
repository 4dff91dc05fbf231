//! Cart and checkout payloads

use serde::{Deserialize, Serialize};

use super::order::{Order, ShippingAddress};

/// One cart line, as submitted by the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub quantity: i64,
}

/// Checkout request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub address: ShippingAddress,
    pub payment_method: String,
}

/// Result of splitting a cart: one order per seller, reconciled
/// independently thereafter. The session exists for customer-facing UI;
/// it carries no lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub customer_id: String,
    pub orders: Vec<Order>,
    /// Sum of the per-seller order totals, in currency unit
    pub grand_total: f64,
}
