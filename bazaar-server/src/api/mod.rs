//! HTTP API

pub mod auth;
pub mod checkout;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod partial_payments;
pub mod products;
pub mod returns;

use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use shared::AppError;

/// Handler result: JSON payload or an error rendered through the shared
/// response envelope
pub type ApiResult<T> = Result<Json<T>, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Provider webhook (signature-verified, raw body, no session identity)
    let webhook = Router::new().route(
        "/webhooks/payment",
        post(crate::payments::webhook::handle),
    );

    let api = Router::new()
        .route("/api/products", post(products::create))
        .route("/api/products/{id}", get(products::get))
        .route("/api/checkout", post(checkout::create))
        .route("/api/checkout/{id}", get(checkout::get))
        .route("/api/orders/{id}", get(orders::get))
        .route("/api/orders/{id}/ship", post(orders::ship))
        .route("/api/orders/{id}/deliver", post(orders::deliver))
        .route("/api/orders/{id}/cancel", post(orders::cancel))
        .route(
            "/api/orders/{id}/payments",
            get(partial_payments::status).post(partial_payments::create),
        )
        .route("/api/payments/{id}/complete", post(partial_payments::complete))
        .route("/api/payments/{id}/refund", post(partial_payments::refund))
        .route("/api/returns", post(returns::create))
        .route("/api/returns/{id}", get(returns::get))
        .route("/api/returns/{id}/approve", post(returns::approve))
        .route("/api/returns/{id}/reject", post(returns::reject))
        .route("/api/returns/{id}/receive", post(returns::receive))
        .route("/api/returns/{id}/refund", post(returns::refund))
        .route("/api/inventory/low-stock", get(inventory::low_stock))
        .route(
            "/api/inventory/{product_id}",
            get(inventory::get_stock).post(inventory::adjust_stock),
        )
        .route("/api/inventory/{product_id}/movements", get(inventory::movements))
        .route("/api/inventory/{product_id}/forecast", get(inventory::forecast));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhook)
        .merge(api)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
