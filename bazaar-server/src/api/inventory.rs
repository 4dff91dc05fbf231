//! Inventory and forecast endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::models::{StockForecast, StockMovement, StockOperation};
use shared::{AppError, ErrorCode};

use crate::api::auth::{AuthUser, Role};
use crate::state::AppState;

use super::ApiResult;

/// GET /api/inventory/{product_id}
pub async fn get_stock(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let stock = crate::inventory::get_available_stock(&state.db, &product_id).await?;
    Ok(Json(serde_json::json!({
        "productId": product_id,
        "stock": stock,
    })))
}

#[derive(Deserialize)]
pub struct AdjustStock {
    pub quantity: i64,
    pub operation: StockOperation,
    pub reason: String,
}

/// Sellers only mutate stock for their own products
async fn verify_product_seller(
    state: &AppState,
    user: &AuthUser,
    product_id: &str,
) -> Result<(), AppError> {
    user.require_role(Role::Seller)?;
    if user.role == Role::Seller {
        let product = crate::db::products::find_by_id(&state.db.pool, product_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
        if product.seller_id != user.id {
            return Err(AppError::forbidden("product belongs to another seller"));
        }
    }
    Ok(())
}

/// POST /api/inventory/{product_id}
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
    Json(req): Json<AdjustStock>,
) -> ApiResult<serde_json::Value> {
    verify_product_seller(&state, &user, &product_id).await?;
    if req.reason.trim().is_empty() {
        return Err(AppError::validation("an adjustment reason is required"));
    }

    let applied = crate::inventory::update_stock(
        &state.db,
        &product_id,
        req.quantity,
        req.operation,
        &req.reason,
    )
    .await?;
    if !applied {
        return Err(AppError::insufficient_stock(product_id));
    }
    let stock = crate::inventory::get_available_stock(&state.db, &product_id).await?;
    Ok(Json(serde_json::json!({
        "productId": product_id,
        "stock": stock,
    })))
}

#[derive(Deserialize)]
pub struct MovementsQuery {
    pub limit: Option<i64>,
}

/// GET /api/inventory/{product_id}/movements
pub async fn movements(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
    Query(query): Query<MovementsQuery>,
) -> ApiResult<Vec<StockMovement>> {
    verify_product_seller(&state, &user, &product_id).await?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(
        crate::inventory::movements(&state.db, &product_id, limit).await?,
    ))
}

/// GET /api/inventory/{product_id}/forecast
pub async fn forecast(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<StockForecast> {
    verify_product_seller(&state, &user, &product_id).await?;
    Ok(Json(
        crate::inventory::forecast(&state.db, &product_id, state.lead_time_days).await?,
    ))
}

#[derive(Deserialize)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/inventory/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Vec<StockForecast>> {
    user.require_admin()?;
    let report = crate::inventory::low_stock_report(
        &state.db,
        state.lead_time_days,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(20),
    )
    .await?;
    Ok(Json(report))
}
