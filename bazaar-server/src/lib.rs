//! bazaar-server — multi-vendor order fulfillment and payment reconciliation
//!
//! Splits mixed-seller carts into per-seller orders, reconciles payment
//! provider webhooks against a dual status/payment-status state machine,
//! and keeps product stock consistent through a single audited ledger.

pub mod api;
pub mod checkout;
pub mod config;
pub mod db;
pub mod inventory;
pub mod partial_payments;
pub mod payments;
pub mod retry;
pub mod returns;
pub mod state;
