//! Unified error codes for the Bazaar storefront
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product/inventory errors
//! - 7xxx: Return/refund errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Webhook or request signature verification failed
    SignatureInvalid = 1002,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Operation not legal from the order's current status
    OrderStateInvalid = 4002,
    /// Order has already been paid
    OrderAlreadyPaid = 4003,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4004,

    // ==================== 5xxx: Payment ====================
    /// Partial payment not found
    PaymentNotFound = 5001,
    /// Operation not legal from the payment's current status
    PaymentStateInvalid = 5002,
    /// Payment would exceed the order total
    PaymentExceedsTotal = 5003,
    /// Transient payment provider error (retryable)
    ProviderTransient = 5101,
    /// Permanent payment provider error (not retryable)
    ProviderPermanent = 5102,

    // ==================== 6xxx: Product/Inventory ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Stock decrement would go negative
    InsufficientStock = 6002,
    /// Inventory record not found
    InventoryNotFound = 6003,

    // ==================== 7xxx: Returns ====================
    /// Return request not found
    ReturnNotFound = 7001,
    /// Operation not legal from the return's current status
    ReturnStateInvalid = 7002,
    /// Requested quantity exceeds the ordered quantity
    ReturnQuantityInvalid = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::SignatureInvalid => "Signature verification failed",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderStateInvalid => "Operation not allowed in current order status",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",

            // Payment
            ErrorCode::PaymentNotFound => "Partial payment not found",
            ErrorCode::PaymentStateInvalid => "Operation not allowed in current payment status",
            ErrorCode::PaymentExceedsTotal => "Payment amount exceeds order total",
            ErrorCode::ProviderTransient => "Payment provider temporarily unavailable",
            ErrorCode::ProviderPermanent => "Payment provider rejected the request",

            // Product/Inventory
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InventoryNotFound => "Inventory record not found",

            // Returns
            ErrorCode::ReturnNotFound => "Return request not found",
            ErrorCode::ReturnStateInvalid => "Operation not allowed in current return status",
            ErrorCode::ReturnQuantityInvalid => "Requested quantity exceeds ordered quantity",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            7 => Self::RequiredField,
            8 => Self::ValueOutOfRange,
            1001 => Self::NotAuthenticated,
            1002 => Self::SignatureInvalid,
            2001 => Self::PermissionDenied,
            2003 => Self::AdminRequired,
            4001 => Self::OrderNotFound,
            4002 => Self::OrderStateInvalid,
            4003 => Self::OrderAlreadyPaid,
            4004 => Self::OrderNotCancellable,
            5001 => Self::PaymentNotFound,
            5002 => Self::PaymentStateInvalid,
            5003 => Self::PaymentExceedsTotal,
            5101 => Self::ProviderTransient,
            5102 => Self::ProviderPermanent,
            6001 => Self::ProductNotFound,
            6002 => Self::InsufficientStock,
            6003 => Self::InventoryNotFound,
            7001 => Self::ReturnNotFound,
            7002 => Self::ReturnStateInvalid,
            7003 => Self::ReturnQuantityInvalid,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9005 => Self::ConfigError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::SignatureInvalid,
            ErrorCode::PaymentExceedsTotal,
            ErrorCode::InsufficientStock,
            ErrorCode::ReturnStateInvalid,
            ErrorCode::DatabaseError,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(54321), Err(InvalidErrorCode(54321)));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ErrorCode::InsufficientStock.to_string(), "E6002");
        assert_eq!(ErrorCode::ValidationFailed.to_string(), "E0002");
    }
}
