//! Order endpoints: detail and lifecycle transitions

use axum::Json;
use axum::extract::{Path, State};
use shared::models::Order;
use shared::{AppError, ErrorCode};

use crate::api::auth::{AuthUser, Role};
use crate::payments::lifecycle;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/orders/{id}
///
/// Visible to the owning customer, the owning seller, the assigned courier
/// and admins.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Order> {
    let order = crate::db::orders::find_by_id(&state.db.pool, &order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let visible = match user.role {
        Role::Admin => true,
        Role::Customer => order.customer_id == user.id,
        Role::Seller => order.seller_id == user.id,
        Role::Courier => order.courier_id.as_deref() == Some(user.id.as_str()),
    };
    if !visible {
        return Err(AppError::forbidden("order is not visible to this account"));
    }
    Ok(Json(order))
}

/// POST /api/orders/{id}/ship
pub async fn ship(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Order> {
    user.require_role(Role::Seller)?;
    Ok(Json(lifecycle::mark_shipped(&state.db, &order_id, &user.id).await?))
}

/// POST /api/orders/{id}/deliver
pub async fn deliver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Order> {
    user.require_role(Role::Courier)?;
    Ok(Json(lifecycle::mark_delivered(&state.db, &order_id, &user.id).await?))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Order> {
    user.require_role(Role::Customer)?;
    Ok(Json(lifecycle::cancel_order(&state.db, &order_id, &user.id).await?))
}
