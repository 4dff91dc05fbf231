//! Payment provider webhook
//!
//! Inbound events are trusted only after HMAC verification against the
//! provider secret. The signature header carries a timestamp so replayed
//! captures age out. After verification the handler always acknowledges
//! with 2xx, even when reconciliation partially failed, to stop
//! provider-side retry storms.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use shared::{ApiResponse, AppError, AppResult};

use crate::state::AppState;

use super::{apply_payment_canceled, apply_payment_failed, apply_payment_succeeded};

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Accepted clock skew between the signature timestamp and now
const REPLAY_WINDOW_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Verify a `t=<unix-secs>,v1=<hex>` signature header against the raw body.
///
/// The signed payload is `"{t}.{body}"`, so neither the timestamp nor the
/// body can be swapped independently. Comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &str,
    now_secs: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<&str> = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(AppError::signature_invalid("malformed signature header"));
    };

    if (now_secs - timestamp).abs() > REPLAY_WINDOW_SECS {
        return Err(AppError::signature_invalid("signature timestamp expired"));
    }

    let expected = hex::decode(signature)
        .map_err(|_| AppError::signature_invalid("signature is not valid hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::signature_invalid("invalid signing secret"))?;
    mac.update(format!("{timestamp}.{body}").as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| AppError::signature_invalid("signature mismatch"))
}

/// Sign a body the way the provider does. Used by tests and the local
/// event simulator.
pub fn sign(secret: &str, body: &str, timestamp_secs: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(format!("{timestamp_secs}.{body}").as_bytes());
    format!(
        "t={timestamp_secs},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// POST /webhooks/payment
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<()>>> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::signature_invalid("missing signature header"))?;
    verify_signature(
        &state.webhook_secret,
        header,
        &body,
        chrono::Utc::now().timestamp(),
    )?;

    let event: Value = serde_json::from_str(&body)
        .map_err(|e| AppError::invalid_request(format!("invalid event payload: {e}")))?;
    let event_type = event["type"].as_str().unwrap_or_default().to_string();

    let Some(order_id) = event["metadata"]["orderId"].as_str() else {
        // acknowledge anyway; raising would only trigger provider retries
        tracing::warn!(event_type = %event_type, "payment event without orderId metadata, discarded");
        return Ok(Json(ApiResponse::ok()));
    };

    let applied = match event_type.as_str() {
        "payment_succeeded" => apply_payment_succeeded(&state.db, order_id).await,
        "payment_failed" => apply_payment_failed(&state.db, order_id).await,
        "payment_canceled" => apply_payment_canceled(&state.db, order_id).await,
        other => {
            tracing::warn!(event_type = %other, order_id = %order_id, "unknown payment event type, discarded");
            return Ok(Json(ApiResponse::ok()));
        }
    };

    match applied {
        Ok(applied) => {
            tracing::info!(event_type = %event_type, order_id = %order_id, applied, "payment event processed");
        }
        Err(e) => {
            // still 2xx; the failure is already logged for reconciliation
            tracing::error!(event_type = %event_type, order_id = %order_id, error = %e, "payment event reconciliation failed");
        }
    }
    Ok(Json(ApiResponse::ok()))
}
