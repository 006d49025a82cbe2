//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription row from the database. One row per user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubscriptionRow {
    pub user_id: Uuid,
    pub tier: String,
    pub status: String,
    pub plan_type: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub grace_period_end: Option<DateTime<Utc>>,
    pub credits_daily_used: i32,
    pub credits_monthly_used: i32,
    pub credits_bonus: i32,
    pub credits_last_daily_reset: NaiveDate,
    pub credits_last_monthly_reset: NaiveDate,
    pub razorpay_order_id: Option<String>,
    pub razorpay_customer_id: Option<String>,
    pub razorpay_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Default row for a user seen for the first time
    pub fn new_free(user_id: Uuid, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            user_id,
            tier: "free".to_string(),
            status: "active".to_string(),
            plan_type: None,
            current_period_start: None,
            current_period_end: None,
            grace_period_end: None,
            credits_daily_used: 0,
            credits_monthly_used: 0,
            credits_bonus: 0,
            credits_last_daily_reset: today,
            credits_last_monthly_reset: today,
            razorpay_order_id: None,
            razorpay_customer_id: None,
            razorpay_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot of the credit columns
    pub fn counters(&self) -> CreditCounters {
        CreditCounters {
            daily_used: self.credits_daily_used,
            monthly_used: self.credits_monthly_used,
            bonus: self.credits_bonus,
            last_daily_reset: self.credits_last_daily_reset,
            last_monthly_reset: self.credits_last_monthly_reset,
        }
    }

    /// Overwrite the credit columns
    pub fn set_counters(&mut self, counters: &CreditCounters) {
        self.credits_daily_used = counters.daily_used;
        self.credits_monthly_used = counters.monthly_used;
        self.credits_bonus = counters.bonus;
        self.credits_last_daily_reset = counters.last_daily_reset;
        self.credits_last_monthly_reset = counters.last_monthly_reset;
    }

    /// Snapshot of the billing columns
    pub fn billing(&self) -> BillingFields {
        BillingFields {
            tier: self.tier.clone(),
            status: self.status.clone(),
            plan_type: self.plan_type.clone(),
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            grace_period_end: self.grace_period_end,
            razorpay_order_id: self.razorpay_order_id.clone(),
            razorpay_customer_id: self.razorpay_customer_id.clone(),
            razorpay_subscription_id: self.razorpay_subscription_id.clone(),
        }
    }

    /// Overwrite the billing columns
    pub fn set_billing(&mut self, billing: &BillingFields) {
        self.tier = billing.tier.clone();
        self.status = billing.status.clone();
        self.plan_type = billing.plan_type.clone();
        self.current_period_start = billing.current_period_start;
        self.current_period_end = billing.current_period_end;
        self.grace_period_end = billing.grace_period_end;
        self.razorpay_order_id = billing.razorpay_order_id.clone();
        self.razorpay_customer_id = billing.razorpay_customer_id.clone();
        self.razorpay_subscription_id = billing.razorpay_subscription_id.clone();
    }
}

/// Credit ledger columns, written atomically as a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditCounters {
    pub daily_used: i32,
    pub monthly_used: i32,
    pub bonus: i32,
    pub last_daily_reset: NaiveDate,
    pub last_monthly_reset: NaiveDate,
}

/// Tier, status, period and provider reference columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingFields {
    pub tier: String,
    pub status: String,
    pub plan_type: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub grace_period_end: Option<DateTime<Utc>>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_customer_id: Option<String>,
    pub razorpay_subscription_id: Option<String>,
}

/// Processed provider event
#[derive(Debug, Clone, FromRow)]
pub struct WebhookEventRow {
    pub event_id: String,
    pub event_type: String,
    pub received_at: DateTime<Utc>,
}

/// Provider order and the purchase it was opened for
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PaymentOrderRow {
    pub order_id: String,
    pub user_id: Uuid,
    /// `subscription` or `top_up`
    pub kind: String,
    pub tier: Option<String>,
    pub plan_type: Option<String>,
    pub product_id: Option<String>,
    /// Smallest currency unit
    pub amount: i64,
    pub currency: String,
    /// Set when a confirmation redeemed the order
    pub payment_id: Option<String>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PaymentOrderRow {
    /// Whether a confirmation has already been honoured for this order
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_at.is_some()
    }
}
