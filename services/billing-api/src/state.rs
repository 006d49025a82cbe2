//! Application state for the Billing API service.

use std::sync::Arc;

use minimind_billing_core::BillingService;
use minimind_db::DbPool;

use crate::auth::JwtVerifier;
use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Billing service (credits, subscriptions, payments, webhooks)
    pub billing: Arc<BillingService>,
    /// Bearer token verification
    pub jwt: Arc<JwtVerifier>,
    /// Database pool for readiness checks; `None` on the in-memory store
    pub pool: Option<DbPool>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(billing: BillingService, pool: Option<DbPool>, config: Config) -> Self {
        Self {
            billing: Arc::new(billing),
            jwt: Arc::new(JwtVerifier::new(&config.jwt_secret)),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
