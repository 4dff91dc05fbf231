//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// SQLite database file path
    pub database_path: String,
    /// HTTP port
    pub http_port: u16,
    /// Payment provider webhook signing secret
    pub webhook_secret: String,
    /// Payment provider API base URL; refunds are skipped when unset
    pub provider_base_url: Option<String>,
    /// Payment provider API key
    pub provider_api_key: Option<String>,
    /// Order subtotal at or above which shipping is free
    pub free_shipping_floor: f64,
    /// Flat shipping fee below the floor
    pub shipping_flat_fee: f64,
    /// Supplier lead time used by the replenishment forecast, in days
    pub lead_time_days: f64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_f64(name: &str, default: f64) -> f64 {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "bazaar.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            webhook_secret: Self::require_secret("PAYMENT_WEBHOOK_SECRET", &environment)?,
            provider_base_url: std::env::var("PROVIDER_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            provider_api_key: std::env::var("PROVIDER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            free_shipping_floor: Self::parse_f64("FREE_SHIPPING_FLOOR", 50.0),
            shipping_flat_fee: Self::parse_f64("SHIPPING_FLAT_FEE", 5.0),
            lead_time_days: Self::parse_f64("LEAD_TIME_DAYS", 7.0),
            environment,
        })
    }
}
