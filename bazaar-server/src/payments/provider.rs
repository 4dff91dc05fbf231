//! Payment provider client
//!
//! Outbound calls (refunds) go through the retry executor. Transport
//! failures and 5xx responses are transient and retried; 4xx responses are
//! permanent and surface immediately.

use serde_json::json;
use shared::{AppError, ErrorCode};

use crate::retry::{RetryPolicy, retry};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transient provider failure: {0}")]
    Transient(String),
    #[error("provider rejected request: {0}")]
    Permanent(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        let code = match e {
            ProviderError::Transient(_) => ErrorCode::ProviderTransient,
            ProviderError::Permanent(_) => ErrorCode::ProviderPermanent,
        };
        AppError::with_message(code, e.to_string())
    }
}

/// HTTP client for the payment provider's management API
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl ProviderClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            api_key,
            policy: RetryPolicy::default(),
        })
    }

    /// Ask the provider to refund `amount` against an earlier transaction
    pub async fn refund(
        &self,
        transaction_ref: &str,
        amount: f64,
    ) -> Result<(), ProviderError> {
        retry(
            &self.policy,
            ProviderError::is_transient,
            |attempt, err, delay| {
                tracing::warn!(
                    transaction_ref = %transaction_ref,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "provider refund failed, retrying"
                );
            },
            || self.refund_once(transaction_ref, amount),
        )
        .await
    }

    async fn refund_once(&self, transaction_ref: &str, amount: f64) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "transaction_ref": transaction_ref, "amount": amount }))
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() {
            Err(ProviderError::Transient(format!("provider returned {status}")))
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(ProviderError::Permanent(format!(
                "provider returned {status}: {detail}"
            )))
        }
    }
}
