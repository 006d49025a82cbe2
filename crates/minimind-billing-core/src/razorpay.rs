//! Razorpay payment provider implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{OrderRequest, PaymentProvider, ProviderOrder};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Razorpay payment provider
#[derive(Clone)]
pub struct RazorpayProvider {
    client: Client,
    config: BillingConfig,
}

impl RazorpayProvider {
    /// Create a new Razorpay provider
    pub fn new(config: BillingConfig) -> Result<Self, BillingError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BillingError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Make authenticated request to Razorpay
    async fn razorpay_request<T, B>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, BillingError>
    where
        T: for<'de> Deserialize<'de>,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{endpoint}", self.config.api_base);

        let mut request = self.client.request(method, &url).basic_auth(
            &self.config.razorpay_key_id,
            Some(&self.config.razorpay_key_secret),
        );

        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Razorpay API request failed");
            BillingError::ProviderError(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status, &error_body));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Razorpay response");
            BillingError::ProviderError(e.to_string())
        })
    }
}

fn map_error_status(status: StatusCode, body: &str) -> BillingError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(status = %status, "Razorpay rate limit hit");
            BillingError::ProviderRateLimited
        }
        StatusCode::PAYMENT_REQUIRED => {
            warn!(status = %status, body = %body, "Razorpay quota exceeded");
            BillingError::ProviderQuotaExceeded
        }
        _ => {
            error!(status = %status, body = %body, "Razorpay API error");
            BillingError::ProviderError(format!("Razorpay API error: {status}"))
        }
    }
}

#[async_trait]
impl PaymentProvider for RazorpayProvider {
    #[instrument(skip(self, order), fields(amount = order.amount, receipt = %order.receipt))]
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, BillingError> {
        debug!(currency = %order.currency, "Creating Razorpay order");

        let body = RazorpayOrderRequest {
            amount: order.amount,
            currency: &order.currency,
            receipt: &order.receipt,
            notes: &order.notes,
        };

        let created: RazorpayOrder = self
            .razorpay_request(reqwest::Method::POST, "/orders", Some(&body))
            .await?;

        Ok(ProviderOrder {
            id: created.id,
            amount: created.amount,
            currency: created.currency,
        })
    }
}

// Razorpay API wire types

#[derive(Debug, Serialize)]
struct RazorpayOrderRequest<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a HashMap<String, String>,
}

/// Razorpay order object
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
