//! End-to-end webhook reconciliation against the full router

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use bazaar_server::api;
use bazaar_server::payments::webhook;
use bazaar_server::state::AppState;

const SECRET: &str = "whsec_test";

async fn test_app() -> (AppState, Router) {
    let state = AppState::for_tests().await;
    let app = api::create_router(state.clone());
    (state, app)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn authed(method: &str, uri: &str, role: &str, user: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user)
        .header("x-user-role", role);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

fn webhook_event(order_id: &str, event_type: &str) -> Request<Body> {
    let body = json!({
        "type": event_type,
        "metadata": { "orderId": order_id },
    })
    .to_string();
    let signature = webhook::sign(SECRET, &body, chrono::Utc::now().timestamp());
    Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header(webhook::SIGNATURE_HEADER, signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Create a product with stock and check out one order for it
async fn seed_order(app: &Router) -> (String, String) {
    let (status, product) = send(
        app,
        authed(
            "POST",
            "/api/products",
            "seller",
            "seller-1",
            Some(json!({ "name": "Walnut Desk", "price": 120.0, "initial_stock": 5 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, session) = send(
        app,
        authed(
            "POST",
            "/api/checkout",
            "customer",
            "cust-1",
            Some(json!({
                "items": [{ "product_id": product_id, "quantity": 2 }],
                "address": {
                    "street": "1 Main St",
                    "city": "Springfield",
                    "state": "IL",
                    "postal_code": "62701",
                    "country": "US"
                },
                "payment_method": "card"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = session["orders"][0]["id"].as_str().unwrap().to_string();
    (product_id, order_id)
}

#[tokio::test]
async fn test_signed_webhook_confirms_order_and_decrements_stock() {
    let (_state, app) = test_app().await;
    let (product_id, order_id) = seed_order(&app).await;

    let (status, _) = send(&app, webhook_event(&order_id, "payment_succeeded")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = send(
        &app,
        authed("GET", &format!("/api/orders/{order_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(order["status"], "CONFIRMED");
    assert_eq!(order["payment_status"], "PAID");

    let (_, stock) = send(
        &app,
        authed("GET", &format!("/api/inventory/{product_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(stock["stock"], 3);
}

#[tokio::test]
async fn test_duplicate_webhook_decrements_once() {
    let (_state, app) = test_app().await;
    let (product_id, order_id) = seed_order(&app).await;

    let (first, _) = send(&app, webhook_event(&order_id, "payment_succeeded")).await;
    let (second, _) = send(&app, webhook_event(&order_id, "payment_succeeded")).await;
    assert_eq!(first, StatusCode::OK);
    // duplicate is acknowledged, not an error
    assert_eq!(second, StatusCode::OK);

    let (_, stock) = send(
        &app,
        authed("GET", &format!("/api/inventory/{product_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(stock["stock"], 3);
}

#[tokio::test]
async fn test_unsigned_webhook_rejected_without_state_change() {
    let (_state, app) = test_app().await;
    let (_, order_id) = seed_order(&app).await;

    let body = json!({
        "type": "payment_succeeded",
        "metadata": { "orderId": order_id },
    })
    .to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header(webhook::SIGNATURE_HEADER, "t=1,v1=deadbeef")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, order) = send(
        &app,
        authed("GET", &format!("/api/orders/{order_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(order["status"], "PENDING");
}

#[tokio::test]
async fn test_event_without_order_id_acknowledged() {
    let (_state, app) = test_app().await;

    let body = json!({ "type": "payment_succeeded", "metadata": {} }).to_string();
    let signature = webhook::sign(SECRET, &body, chrono::Utc::now().timestamp());
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/payment")
        .header(webhook::SIGNATURE_HEADER, signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_payment_marks_order() {
    let (_state, app) = test_app().await;
    let (product_id, order_id) = seed_order(&app).await;

    let (status, _) = send(&app, webhook_event(&order_id, "payment_failed")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = send(
        &app,
        authed("GET", &format!("/api/orders/{order_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(order["status"], "PAYMENT_FAILED");
    assert_eq!(order["payment_status"], "FAILED");

    // no payment, no decrement
    let (_, stock) = send(
        &app,
        authed("GET", &format!("/api/inventory/{product_id}"), "customer", "cust-1", None),
    )
    .await;
    assert_eq!(stock["stock"], 5);
}

#[tokio::test]
async fn test_missing_identity_rejected() {
    let (_state, app) = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/orders/some-order")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_ne!(body["code"], 0);
}
