//! Shared types for the Bazaar storefront
//!
//! Cross-cutting library used by the fulfillment service:
//! - [`error`]: unified error codes, [`AppError`] and the API response envelope
//! - [`models`]: domain entities (orders, inventory, partial payments, returns)
//! - [`money`]: decimal-backed monetary arithmetic helpers

pub mod error;
pub mod models;
pub mod money;

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
