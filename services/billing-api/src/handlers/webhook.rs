//! Razorpay webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use super::shared::record_op_duration;
use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the hex HMAC of the raw body
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Header carrying the provider's delivery ID
pub const EVENT_ID_HEADER: &str = "x-razorpay-event-id";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhooks/razorpay
///
/// Verifies the signature over the raw body, then applies the event once.
/// Duplicates and events for unknown subscriptions are acknowledged so the
/// provider stops retrying; storage failures answer 500 so it retries.
pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let start = Instant::now();

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event_id = headers.get(EVENT_ID_HEADER).and_then(|v| v.to_str().ok());

    let result = state
        .billing
        .process_webhook(&body, signature, event_id)
        .await;
    record_op_duration("process_webhook", start, result.is_ok());

    match result {
        Ok(outcome) => {
            tracing::debug!(outcome = outcome.as_str(), "Webhook handled");
            Ok(Json(WebhookAck { received: true }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Webhook rejected");
            Err(e.into())
        }
    }
}
