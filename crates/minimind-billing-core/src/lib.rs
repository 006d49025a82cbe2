//! MiniMind Billing Core - Billing business logic
//!
//! Credit accounting, tier resolution and Razorpay payment handling for
//! MiniMind:
//!
//! - [`ledger`]: per-user daily/monthly credit ledger with lazy rollover
//! - [`tier`]: effective tier from stored status, period and grace period
//! - [`signature`]: the HMAC-SHA256 check shared by every provider callback
//! - [`orders`]: checkout orders and what each one was opened to buy
//! - [`verifier`]: client-side payment confirmation
//! - [`webhook`]: Razorpay lifecycle events
//! - [`service`]: the [`BillingService`] facade used by the HTTP layer
//!
//! # Example
//!
//! ```rust,ignore
//! use minimind_billing_core::{BillingConfig, BillingService, LedgerConfig, RazorpayProvider};
//!
//! let config = BillingConfig::new("rzp_test_key", "key_secret", "webhook_secret");
//! let provider = RazorpayProvider::new(config.clone())?;
//! let billing = BillingService::new(
//!     Arc::new(repos.subscriptions),
//!     Arc::new(repos.webhook_events),
//!     Arc::new(repos.payment_orders),
//!     Arc::new(provider),
//!     config,
//!     LedgerConfig::default(),
//! );
//!
//! if billing.has_credits(&user_id, Feature::Mastery.cost()).await? {
//!     // ... run the feature ...
//!     billing.use_credits(&user_id, Feature::Mastery.cost(), "mastery").await?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod orders;
pub mod provider;
pub mod razorpay;
pub mod service;
pub mod signature;
pub mod tier;
pub mod verifier;
pub mod webhook;

pub use config::{BillingConfig, LedgerConfig};
pub use error::{BillingError, BillingResult};
pub use ledger::{resolve_credit_state, CreditLedger, CreditSpend};
pub use provider::{OrderRequest, PaymentProvider, ProviderOrder};
pub use razorpay::RazorpayProvider;
pub use service::{BillingService, CreditCheck, SubscriptionView, TopUpResult};
pub use tier::{effective_tier, is_feature_locked, locked_features};
pub use verifier::{PaymentConfirmation, PaymentVerifier};
pub use webhook::{WebhookEvent, WebhookEventType, WebhookHandler, WebhookOutcome};
