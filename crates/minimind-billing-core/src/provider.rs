//! Payment provider abstraction

use std::collections::HashMap;

use async_trait::async_trait;

use crate::BillingError;

/// Order to open with the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Amount in the smallest currency unit
    pub amount: u64,
    /// ISO currency code
    pub currency: String,
    /// Merchant-side receipt reference
    pub receipt: String,
    /// Free-form key/values echoed back in webhooks
    pub notes: HashMap<String, String>,
}

/// Order as created by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrder {
    /// Provider order ID
    pub id: String,
    /// Amount in the smallest currency unit
    pub amount: u64,
    /// ISO currency code
    pub currency: String,
}

/// Payment provider trait
///
/// Abstracts payment processing so the service can be exercised without a
/// live provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an order the client then pays through the checkout widget
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, BillingError>;
}
