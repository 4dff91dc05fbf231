//! Shared application state

use std::sync::Arc;

use crate::checkout::ShippingPolicy;
use crate::config::Config;
use crate::db::DbService;
use crate::payments::provider::ProviderClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub db: DbService,
    /// Payment provider webhook signing secret
    pub webhook_secret: String,
    pub shipping: ShippingPolicy,
    /// Supplier lead time for the replenishment forecast, in days
    pub lead_time_days: f64,
    /// Outbound provider client; None means refunds settle locally only
    pub provider: Option<Arc<ProviderClient>>,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_path).await?;

        let provider = match (&config.provider_base_url, &config.provider_api_key) {
            (Some(url), Some(key)) => Some(Arc::new(ProviderClient::new(
                url.clone(),
                key.clone(),
            )?)),
            _ => {
                tracing::warn!("payment provider not configured, refunds settle locally");
                None
            }
        };

        Ok(Self {
            db,
            webhook_secret: config.webhook_secret.clone(),
            shipping: ShippingPolicy {
                free_shipping_floor: config.free_shipping_floor,
                flat_fee: config.shipping_flat_fee,
            },
            lead_time_days: config.lead_time_days,
            provider,
        })
    }

    /// In-memory state for tests
    pub async fn for_tests() -> Self {
        Self {
            db: DbService::open_in_memory().await.expect("in-memory db"),
            webhook_secret: "whsec_test".into(),
            shipping: ShippingPolicy::default(),
            lead_time_days: 7.0,
            provider: None,
        }
    }
}
