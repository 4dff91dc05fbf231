//! Product catalog endpoints

use axum::Json;
use axum::extract::{Path, State};
use shared::models::{Product, ProductCreate, StockOperation};
use shared::{AppError, ErrorCode};

use crate::api::auth::{AuthUser, Role};
use crate::state::AppState;

use super::ApiResult;

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ProductCreate>,
) -> ApiResult<Product> {
    user.require_role(Role::Seller)?;
    if req.name.trim().is_empty() {
        return Err(AppError::validation("product name is required"));
    }
    if req.price <= 0.0 {
        return Err(AppError::validation("price must be positive"));
    }

    let product = crate::db::products::create(&state.db.pool, &user.id, &req.name, req.price).await?;
    if req.initial_stock > 0 {
        crate::inventory::update_stock(
            &state.db,
            &product.id,
            req.initial_stock,
            StockOperation::Set,
            "initial stock",
        )
        .await?;
    }
    Ok(Json(product))
}

/// GET /api/products/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Product> {
    let product = crate::db::products::find_by_id(&state.db.pool, &product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}
