//! Configuration for the Billing API service.

use std::time::Duration;

use minimind_billing_core::{BillingConfig, LedgerConfig};

/// Billing API configuration
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Credit ledger configuration
    pub ledger: LedgerConfig,
    /// Shared secret bearer tokens are signed with
    pub jwt_secret: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        // Database
        let database_url = required("DATABASE_URL")?;

        // Server port
        let http_port = lookup("HTTP_PORT")
            .unwrap_or_else(|| "8081".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Razorpay configuration
        let key_id = required("RAZORPAY_KEY_ID")?;
        let key_secret = required("RAZORPAY_KEY_SECRET")?;
        let webhook_secret = required("RAZORPAY_WEBHOOK_SECRET")?;
        let currency = lookup("CURRENCY").unwrap_or_else(|| "INR".to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid("CURRENCY"));
        }

        // Auth
        let jwt_secret = required("SUPABASE_JWT_SECRET")?;

        // Early access switches off credit deduction
        let early_access = parse_bool(lookup("EARLY_ACCESS").as_deref(), false)
            .ok_or(ConfigError::Invalid("EARLY_ACCESS"))?;

        // Request timeout
        let request_timeout_secs: u64 = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = parse_bool(lookup("METRICS_ENABLED").as_deref(), true).unwrap_or(true);

        let mut billing =
            BillingConfig::new(key_id, key_secret, webhook_secret).with_currency(currency);
        if let Some(api_base) = lookup("RAZORPAY_API_BASE") {
            billing = billing.with_api_base(api_base);
        }

        Ok(Self {
            http_port,
            database_url,
            billing,
            ledger: LedgerConfig { early_access },
            jwt_secret,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Some(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("billing", &self.billing)
            .field("ledger", &self.ledger)
            .field("request_timeout", &self.request_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish_non_exhaustive()
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
