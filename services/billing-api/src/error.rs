//! Error types for the Billing API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use minimind_billing_core::BillingError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[from] minimind_db::DbError),

    #[error(transparent)]
    Billing(#[from] BillingError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Billing(e) => match e {
                BillingError::InvalidSignature
                | BillingError::InvalidTier(_)
                | BillingError::InvalidPurchase(_)
                | BillingError::WebhookError(_) => StatusCode::BAD_REQUEST,
                BillingError::FeatureLocked(_) => StatusCode::FORBIDDEN,
                BillingError::AlreadyProcessed | BillingError::Conflict(_) => StatusCode::CONFLICT,
                BillingError::ProviderRateLimited => StatusCode::TOO_MANY_REQUESTS,
                BillingError::ProviderQuotaExceeded => StatusCode::PAYMENT_REQUIRED,
                BillingError::ProviderError(_) => StatusCode::BAD_GATEWAY,
                BillingError::Database(_) | BillingError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
            Self::Billing(e) => match e {
                BillingError::InvalidSignature => "INVALID_SIGNATURE",
                BillingError::InvalidTier(_) | BillingError::InvalidPurchase(_) => "BAD_REQUEST",
                BillingError::WebhookError(_) => "WEBHOOK_ERROR",
                BillingError::FeatureLocked(_) => "FEATURE_LOCKED",
                BillingError::AlreadyProcessed => "ALREADY_PROCESSED",
                BillingError::Conflict(_) => "CONFLICT",
                BillingError::ProviderRateLimited => "RATE_LIMITED",
                BillingError::ProviderQuotaExceeded => "QUOTA_EXCEEDED",
                BillingError::ProviderError(_) => "PROVIDER_ERROR",
                BillingError::Database(_) | BillingError::Internal(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Message safe to show the caller
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::BAD_GATEWAY => "Payment provider unavailable".to_string(),
            StatusCode::TOO_MANY_REQUESTS => "Payment provider is busy, try again shortly".to_string(),
            StatusCode::PAYMENT_REQUIRED => "Payment provider quota exceeded".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors
        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.error_code(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
