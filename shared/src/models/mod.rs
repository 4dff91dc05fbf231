//! Domain models for the Bazaar storefront

pub mod cart;
pub mod inventory;
pub mod order;
pub mod partial_payment;
pub mod product;
pub mod return_request;

pub use cart::{CartItem, CheckoutRequest, CheckoutSession};
pub use inventory::{
    InventoryRecord, StockForecast, StockMovement, StockOperation, Urgency,
};
pub use order::{LineItem, Order, OrderStatus, PaymentStatus, ShippingAddress};
pub use partial_payment::{PartialPayment, PartialPaymentStatus, PaymentSchedule};
pub use product::{Product, ProductCreate};
pub use return_request::{RefundMethod, ReturnRequest, ReturnStatus};
