//! Return workflow endpoints

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::AppError;
use shared::models::{RefundMethod, ReturnRequest};

use crate::api::auth::{AuthUser, Role};
use crate::state::AppState;

use super::ApiResult;

#[derive(Deserialize)]
pub struct CreateReturn {
    pub order_id: String,
    /// None requests a whole-order return
    pub product_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub reason: String,
    #[serde(default = "default_refund_method")]
    pub refund_method: RefundMethod,
}

fn default_quantity() -> i64 {
    1
}

fn default_refund_method() -> RefundMethod {
    RefundMethod::Original
}

/// POST /api/returns
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateReturn>,
) -> ApiResult<ReturnRequest> {
    user.require_role(Role::Customer)?;
    let request = crate::returns::request_return(
        &state.db,
        &user.id,
        &req.order_id,
        req.product_id,
        req.quantity,
        &req.reason,
        req.refund_method,
    )
    .await?;
    Ok(Json(request))
}

/// Sellers act only on returns against their own orders
async fn verify_seller(state: &AppState, user: &AuthUser, return_id: &str) -> Result<(), AppError> {
    user.require_role(Role::Seller)?;
    if user.role == Role::Seller {
        let request = crate::db::returns::find_by_id(&state.db.pool, return_id)
            .await?
            .ok_or_else(|| AppError::not_found("return request"))?;
        let order = crate::db::orders::find_by_id(&state.db.pool, &request.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order"))?;
        if order.seller_id != user.id {
            return Err(AppError::forbidden("return belongs to another seller"));
        }
    }
    Ok(())
}

/// POST /api/returns/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(return_id): Path<String>,
) -> ApiResult<ReturnRequest> {
    verify_seller(&state, &user, &return_id).await?;
    Ok(Json(crate::returns::approve(&state.db, &return_id, &user.id).await?))
}

#[derive(Deserialize)]
pub struct RejectReturn {
    pub reason: String,
}

/// POST /api/returns/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(return_id): Path<String>,
    Json(req): Json<RejectReturn>,
) -> ApiResult<ReturnRequest> {
    verify_seller(&state, &user, &return_id).await?;
    Ok(Json(
        crate::returns::reject(&state.db, &return_id, &req.reason, &user.id).await?,
    ))
}

/// POST /api/returns/{id}/receive
pub async fn receive(
    State(state): State<AppState>,
    user: AuthUser,
    Path(return_id): Path<String>,
) -> ApiResult<ReturnRequest> {
    verify_seller(&state, &user, &return_id).await?;
    Ok(Json(crate::returns::mark_received(&state.db, &return_id).await?))
}

/// POST /api/returns/{id}/refund
///
/// Finance-side step, admin only; decoupled from physical receipt.
pub async fn refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(return_id): Path<String>,
) -> ApiResult<ReturnRequest> {
    user.require_admin()?;
    let provider = state.provider.as_deref();
    Ok(Json(
        crate::returns::issue_refund(&state.db, &return_id, provider).await?,
    ))
}

/// GET /api/returns/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(return_id): Path<String>,
) -> ApiResult<ReturnRequest> {
    let request = crate::db::returns::find_by_id(&state.db.pool, &return_id)
        .await?
        .ok_or_else(|| AppError::not_found("return request"))?;
    if user.role == Role::Customer {
        let order = crate::db::orders::find_by_id(&state.db.pool, &request.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order"))?;
        if order.customer_id != user.id {
            return Err(AppError::forbidden("return belongs to another customer"));
        }
    }
    Ok(Json(request))
}
