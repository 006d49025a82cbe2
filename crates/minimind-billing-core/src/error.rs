//! Billing errors

use minimind_types::{Feature, ParseError};
use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Payment signature did not match
    #[error("invalid payment signature")]
    InvalidSignature,

    /// Tier cannot be purchased
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    /// Malformed purchase or unknown product
    #[error("invalid purchase: {0}")]
    InvalidPurchase(String),

    /// Feature not available on the user's tier
    #[error("feature locked: {0}")]
    FeatureLocked(Feature),

    /// Payment already applied
    #[error("payment already processed")]
    AlreadyProcessed,

    /// Provider is throttling us
    #[error("provider rate limited")]
    ProviderRateLimited,

    /// Provider account quota exhausted
    #[error("provider quota exceeded")]
    ProviderQuotaExceeded,

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or processing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Concurrent writers kept winning
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] minimind_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a client-side validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSignature
                | Self::InvalidTier(_)
                | Self::InvalidPurchase(_)
                | Self::WebhookError(_)
        )
    }

    /// Check if this is a provider error
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderRateLimited | Self::ProviderQuotaExceeded | Self::ProviderError(_)
        )
    }
}

impl From<ParseError> for BillingError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Tier(t) => Self::InvalidTier(t),
            other => Self::InvalidPurchase(other.to_string()),
        }
    }
}

/// Result type for billing operations
pub type BillingResult<T> = Result<T, BillingError>;
