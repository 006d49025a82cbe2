//! Billing configuration

/// Razorpay API base URL
pub const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Billing service configuration
#[derive(Clone)]
pub struct BillingConfig {
    /// Razorpay key ID (public, handed to the checkout widget)
    pub razorpay_key_id: String,
    /// Razorpay key secret (API auth and payment signatures)
    pub razorpay_key_secret: String,
    /// Razorpay webhook secret
    pub razorpay_webhook_secret: String,
    /// ISO currency code for orders
    pub currency: String,
    /// Razorpay API base URL
    pub api_base: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        razorpay_key_id: impl Into<String>,
        razorpay_key_secret: impl Into<String>,
        razorpay_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            razorpay_key_id: razorpay_key_id.into(),
            razorpay_key_secret: razorpay_key_secret.into(),
            razorpay_webhook_secret: razorpay_webhook_secret.into(),
            currency: "INR".to_string(),
            api_base: RAZORPAY_API_BASE.to_string(),
        }
    }

    /// Whether the key pair belongs to Razorpay's test mode
    pub fn is_test_mode(&self) -> bool {
        self.razorpay_key_id.starts_with("rzp_test_")
    }

    /// Set the order currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Point the provider client at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("razorpay_key_id", &self.razorpay_key_id)
            .field("razorpay_key_secret", &"[REDACTED]")
            .field("razorpay_webhook_secret", &"[REDACTED]")
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Credit ledger configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerConfig {
    /// Bypass credit deduction entirely
    pub early_access: bool,
}

impl LedgerConfig {
    /// Config with early access switched on
    pub fn early_access() -> Self {
        Self { early_access: true }
    }
}
