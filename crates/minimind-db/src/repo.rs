//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription row for a user
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by Razorpay subscription ID
    async fn find_by_razorpay_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by the last Razorpay order created for it
    async fn find_by_razorpay_order_id(&self, order_id: &str) -> DbResult<Option<SubscriptionRow>>;

    /// Return the user's row, inserting a free default first if none exists
    async fn get_or_create(&self, user_id: Uuid, today: NaiveDate) -> DbResult<SubscriptionRow>;

    /// Write new credit counters only if the stored ones still equal `expected`.
    ///
    /// Returns `false` when another writer got there first.
    async fn compare_and_swap_credits(
        &self,
        user_id: Uuid,
        expected: &CreditCounters,
        new: &CreditCounters,
    ) -> DbResult<bool>;

    /// Overwrite tier, status, period and provider columns
    async fn update_billing(&self, user_id: Uuid, billing: &BillingFields) -> DbResult<()>;
}

/// Webhook event log
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Record an event ID. Returns `false` if it was already recorded.
    async fn record(&self, event_id: &str, event_type: &str) -> DbResult<bool>;

    /// Forget an event so a provider retry is processed again
    async fn remove(&self, event_id: &str) -> DbResult<()>;
}

/// Orders opened with the payment provider
#[async_trait]
pub trait PaymentOrderRepository: Send + Sync {
    /// Store a newly opened order
    async fn create(&self, order: &PaymentOrderRow) -> DbResult<()>;

    /// Find an order by provider order ID
    async fn find_by_order_id(&self, order_id: &str) -> DbResult<Option<PaymentOrderRow>>;

    /// Mark an order redeemed by `payment_id`.
    ///
    /// Returns `false` if the order was already redeemed (or does not exist).
    async fn redeem(
        &self,
        order_id: &str,
        payment_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool>;

    /// Undo a redemption whose effects could not be applied
    async fn release(&self, order_id: &str) -> DbResult<()>;
}
