//! Checkout endpoints

use axum::Json;
use axum::extract::{Path, State};
use shared::AppError;
use shared::models::{CheckoutRequest, CheckoutSession};

use crate::api::auth::{AuthUser, Role};
use crate::state::AppState;

use super::ApiResult;

/// POST /api/checkout
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<CheckoutSession> {
    user.require_role(Role::Customer)?;
    let session = crate::checkout::checkout(&state.db, &state.shipping, &user.id, request).await?;
    Ok(Json(session))
}

/// GET /api/checkout/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(checkout_id): Path<String>,
) -> ApiResult<CheckoutSession> {
    let orders = crate::db::orders::find_by_checkout(&state.db.pool, &checkout_id).await?;
    if orders.is_empty() {
        return Err(AppError::not_found("checkout session"));
    }
    if user.role != Role::Admin && orders[0].customer_id != user.id {
        return Err(AppError::forbidden("checkout belongs to another customer"));
    }
    let grand_total = shared::money::to_f64(
        orders
            .iter()
            .map(|o| shared::money::to_decimal(o.total))
            .sum(),
    );
    Ok(Json(CheckoutSession {
        id: checkout_id,
        customer_id: orders[0].customer_id.clone(),
        grand_total,
        orders,
    }))
}
