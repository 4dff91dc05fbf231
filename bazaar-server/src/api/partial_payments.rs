//! Partial payment endpoints

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::models::{PartialPayment, PaymentSchedule};

use crate::api::auth::{AuthUser, Role};
use crate::state::AppState;

use super::ApiResult;

#[derive(Deserialize)]
pub struct CreatePartialPayment {
    pub amount: f64,
    pub method: String,
    pub transaction_ref: Option<String>,
}

/// POST /api/orders/{id}/payments
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    Json(req): Json<CreatePartialPayment>,
) -> ApiResult<PartialPayment> {
    user.require_role(Role::Customer)?;
    let payment = crate::partial_payments::create(
        &state.db,
        &user.id,
        &order_id,
        req.amount,
        &req.method,
        req.transaction_ref,
    )
    .await?;
    Ok(Json(payment))
}

/// GET /api/orders/{id}/payments
pub async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<PaymentSchedule> {
    Ok(Json(
        crate::partial_payments::status(&state.db, &user.id, &order_id).await?,
    ))
}

/// POST /api/payments/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<String>,
) -> ApiResult<PartialPayment> {
    user.require_role(Role::Customer)?;
    Ok(Json(
        crate::partial_payments::complete(&state.db, &user.id, &payment_id).await?,
    ))
}

/// POST /api/payments/{id}/refund
pub async fn refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<String>,
) -> ApiResult<PartialPayment> {
    user.require_role(Role::Customer)?;
    Ok(Json(
        crate::partial_payments::refund(&state.db, &user.id, &payment_id).await?,
    ))
}
