//! Razorpay webhook handling

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, instrument, warn};

use minimind_db::{BillingFields, SubscriptionRepository, SubscriptionRow, WebhookEventRepository};
use minimind_types::{PlanType, SubscriptionStatus, Tier, UserId};

use crate::error::{BillingError, BillingResult};
use crate::signature;

/// Days of pro access kept after a cancellation takes effect
pub const GRACE_PERIOD_DAYS: i64 = 7;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Payment captured
    PaymentCaptured,
    /// Payment failed
    PaymentFailed,
    /// Recurring charge succeeded
    SubscriptionCharged,
    /// Subscription cancelled
    SubscriptionCancelled,
    /// Subscription ran out
    SubscriptionExpired,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "payment.captured" => Self::PaymentCaptured,
            "payment.failed" => Self::PaymentFailed,
            "subscription.charged" => Self::SubscriptionCharged,
            "subscription.cancelled" => Self::SubscriptionCancelled,
            "subscription.expired" => Self::SubscriptionExpired,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl WebhookEventType {
    /// Razorpay event name
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentCaptured => "payment.captured",
            Self::PaymentFailed => "payment.failed",
            Self::SubscriptionCharged => "subscription.charged",
            Self::SubscriptionCancelled => "subscription.cancelled",
            Self::SubscriptionExpired => "subscription.expired",
            Self::Unknown(name) => name,
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID used for deduplication
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Subscription entity, if the event carries one
    pub subscription: Option<SubscriptionEntity>,
    /// Payment entity, if the event carries one
    pub payment: Option<PaymentEntity>,
    /// When the event was created (Unix timestamp)
    pub created_at: i64,
}

impl WebhookEvent {
    /// `user_id` from the entity notes, set when the order was created
    pub fn user_id_note(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .and_then(|s| s.notes.get("user_id"))
            .or_else(|| self.payment.as_ref().and_then(|p| p.notes.get("user_id")))
            .map(String::as_str)
    }
}

/// Subscription entity data
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEntity {
    /// Razorpay subscription ID
    pub id: String,
    /// Customer ID
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Provider-side status
    #[serde(default)]
    pub status: Option<String>,
    /// Notes attached at creation
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: HashMap<String, String>,
}

/// Payment entity data
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    /// Razorpay payment ID
    pub id: String,
    /// Order the payment belongs to
    #[serde(default)]
    pub order_id: Option<String>,
    /// Customer ID
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Amount in paise
    #[serde(default)]
    pub amount: Option<u64>,
    /// Notes attached to the order
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: HashMap<String, String>,
}

/// What processing an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Subscription row changed
    Applied,
    /// Event matched a row but required no change
    Unchanged,
    /// Event ID already processed
    Duplicate,
    /// No subscription row matched the event
    Unmatched,
    /// Event type not handled
    Ignored,
}

impl WebhookOutcome {
    /// Metric label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Duplicate => "duplicate",
            Self::Unmatched => "unmatched",
            Self::Ignored => "ignored",
        }
    }
}

/// Billing state after applying `event` to `row` at `now`.
///
/// Returns the row's current state unchanged when the event calls for no
/// transition.
pub fn apply_event(
    row: &SubscriptionRow,
    event: &WebhookEvent,
    now: DateTime<Utc>,
) -> BillingResult<BillingFields> {
    let mut next = row.billing();

    if let Some(sub) = &event.subscription {
        if next.razorpay_subscription_id.as_deref() != Some(sub.id.as_str()) {
            next.razorpay_subscription_id = Some(sub.id.clone());
        }
    }

    match &event.event_type {
        WebhookEventType::SubscriptionCharged => {
            let base = next.current_period_end.map_or(now, |end| end.max(now));
            let end = base
                .checked_add_months(Months::new(1))
                .ok_or_else(|| BillingError::Internal("period end out of range".to_string()))?;
            next.tier = Tier::Pro.as_str().to_string();
            next.status = SubscriptionStatus::Active.as_str().to_string();
            if next.plan_type.is_none() {
                next.plan_type = Some(PlanType::Monthly.as_str().to_string());
            }
            next.current_period_start = Some(base);
            next.current_period_end = Some(end);
            next.grace_period_end = None;
        }
        WebhookEventType::SubscriptionCancelled => {
            let from = next.current_period_end.unwrap_or(now);
            next.status = SubscriptionStatus::Cancelled.as_str().to_string();
            next.grace_period_end = Some(from + Duration::days(GRACE_PERIOD_DAYS));
        }
        WebhookEventType::SubscriptionExpired => {
            let grace_over = next.grace_period_end.map_or(true, |grace| now > grace);
            if grace_over {
                next.tier = Tier::Free.as_str().to_string();
                next.status = SubscriptionStatus::Expired.as_str().to_string();
                next.plan_type = None;
                next.grace_period_end = None;
            } else {
                debug!(user_id = %row.user_id, "Expiry during grace period, keeping access");
            }
        }
        WebhookEventType::PaymentCaptured => {
            let customer = event
                .payment
                .as_ref()
                .and_then(|p| p.customer_id.clone())
                .or_else(|| event.subscription.as_ref().and_then(|s| s.customer_id.clone()));
            if customer.is_some() {
                next.razorpay_customer_id = customer;
            }
        }
        WebhookEventType::PaymentFailed => {
            if next.status == SubscriptionStatus::Pending.as_str() {
                next.status = SubscriptionStatus::Active.as_str().to_string();
            }
        }
        WebhookEventType::Unknown(_) => {}
    }

    Ok(next)
}

/// Webhook handler for processing Razorpay events
#[derive(Clone)]
pub struct WebhookHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    events: Arc<dyn WebhookEventRepository>,
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        events: Arc<dyn WebhookEventRepository>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            subscriptions,
            events,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        event_id: Option<&str>,
    ) -> BillingResult<WebhookEvent> {
        let signature = signature.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
            warn!("Webhook received without signature");
            BillingError::WebhookError("missing signature".to_string())
        })?;

        if !signature::verify(payload, signature, &self.webhook_secret) {
            error!("Webhook signature verification failed");
            metrics::counter!("billing_webhooks_processed_total", "outcome" => "invalid_signature")
                .increment(1);
            return Err(BillingError::WebhookError(
                "signature verification failed".to_string(),
            ));
        }

        let raw: RawRazorpayEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        let subscription = raw.payload.subscription.map(|w| w.entity);
        let payment = raw.payload.payment.map(|w| w.entity);

        let id = event_id
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or(raw.id)
            .unwrap_or_else(|| {
                let entity_id = subscription
                    .as_ref()
                    .map(|s| s.id.as_str())
                    .or_else(|| payment.as_ref().map(|p| p.id.as_str()))
                    .unwrap_or("none");
                format!("{}:{entity_id}:{}", raw.event, raw.created_at)
            });

        debug!(event_id = %id, event_type = %raw.event, "Parsed webhook event");

        Ok(WebhookEvent {
            id,
            event_type: WebhookEventType::from(raw.event.as_str()),
            subscription,
            payment,
            created_at: raw.created_at,
        })
    }

    /// Apply an event once.
    ///
    /// The event ID is recorded before the row is touched; if applying fails
    /// the record is dropped again so the provider's retry goes through.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type.as_str()))]
    pub async fn process(
        &self,
        event: &WebhookEvent,
        now: DateTime<Utc>,
    ) -> BillingResult<WebhookOutcome> {
        if let WebhookEventType::Unknown(name) = &event.event_type {
            info!(event_type = %name, "Ignoring unhandled webhook event");
            return Ok(WebhookOutcome::Ignored);
        }

        if !self
            .events
            .record(&event.id, event.event_type.as_str())
            .await?
        {
            info!("Webhook event already processed");
            return Ok(WebhookOutcome::Duplicate);
        }

        match self.apply(event, now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(remove_err) = self.events.remove(&event.id).await {
                    error!(error = %remove_err, "Failed to release webhook event record");
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, event: &WebhookEvent, now: DateTime<Utc>) -> BillingResult<WebhookOutcome> {
        let Some(row) = self.find_row(event).await? else {
            warn!("No subscription matches webhook event");
            return Ok(WebhookOutcome::Unmatched);
        };

        let next = apply_event(&row, event, now)?;
        if next == row.billing() {
            return Ok(WebhookOutcome::Unchanged);
        }

        self.subscriptions
            .update_billing(row.user_id, &next)
            .await?;

        info!(
            user_id = %row.user_id,
            tier = %next.tier,
            status = %next.status,
            "Subscription updated from webhook"
        );
        Ok(WebhookOutcome::Applied)
    }

    /// Locate the row by subscription ID, then the `user_id` note, then order ID
    async fn find_row(&self, event: &WebhookEvent) -> BillingResult<Option<SubscriptionRow>> {
        if let Some(sub) = &event.subscription {
            if let Some(row) = self
                .subscriptions
                .find_by_razorpay_subscription_id(&sub.id)
                .await?
            {
                return Ok(Some(row));
            }
        }

        if let Some(user_id) = event.user_id_note() {
            match user_id.parse::<UserId>() {
                Ok(id) => {
                    if let Some(row) = self.subscriptions.find_by_user_id(id.0).await? {
                        return Ok(Some(row));
                    }
                }
                Err(_) => warn!(user_id = %user_id, "Malformed user_id note on webhook"),
            }
        }

        if let Some(order_id) = event.payment.as_ref().and_then(|p| p.order_id.as_deref()) {
            return Ok(self
                .subscriptions
                .find_by_razorpay_order_id(order_id)
                .await?);
        }

        Ok(None)
    }
}

/// Razorpay sends `notes` as an object, or as `[]` when empty.
fn lenient_notes<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Object(map)) = value else {
        return Ok(HashMap::new());
    };
    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

// Raw Razorpay event for parsing
#[derive(Debug, Deserialize)]
struct RawRazorpayEvent {
    #[serde(default)]
    id: Option<String>,
    event: String,
    #[serde(default)]
    payload: RawPayload,
    #[serde(default)]
    created_at: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    #[serde(default)]
    subscription: Option<RawEntity<SubscriptionEntity>>,
    #[serde(default)]
    payment: Option<RawEntity<PaymentEntity>>,
}

#[derive(Debug, Deserialize)]
struct RawEntity<T> {
    entity: T,
}
