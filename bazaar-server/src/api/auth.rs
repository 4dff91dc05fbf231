//! Request identity
//!
//! Authentication itself is upstream (gateway-verified session); requests
//! arrive with a trusted identity in headers. The extractor only rejects
//! requests where the gateway attached nothing.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::{AppError, ErrorCode};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Seller,
    Courier,
    Admin,
}

impl Role {
    fn from_header(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "seller" => Some(Self::Seller),
            "courier" => Some(Self::Courier),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Verified caller identity, supplied by the auth gateway
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    /// Admins pass every role gate
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{role:?} role required")))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::AdminRequired))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(AppError::not_authenticated)?
            .to_string();
        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::from_header)
            .ok_or_else(AppError::not_authenticated)?;
        Ok(AuthUser { id, role })
    }
}
