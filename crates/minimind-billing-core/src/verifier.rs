//! Payment confirmation
//!
//! After checkout the client posts the order ID, payment ID and the signature
//! Razorpay handed it. The signature is recomputed with the key secret, and
//! the order must be one this user opened for this purchase and not yet
//! redeemed, before anything is committed.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use minimind_db::{BillingFields, PaymentOrderRepository, SubscriptionRepository, SubscriptionRow};
use minimind_types::{PlanType, Purchase, Subscription, SubscriptionStatus, Tier, UserId};

use crate::error::{BillingError, BillingResult};
use crate::orders::check_claim;
use crate::signature::{checkout_payload, verify};
use crate::tier::resolve_subscription;

/// What the checkout widget returns to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Razorpay order ID
    pub order_id: String,
    /// Razorpay payment ID
    pub payment_id: String,
    /// Hex HMAC of `order_id|payment_id`
    pub signature: String,
}

/// Verifies checkout confirmations and commits upgrades
#[derive(Clone)]
pub struct PaymentVerifier {
    subscriptions: Arc<dyn SubscriptionRepository>,
    orders: Arc<dyn PaymentOrderRepository>,
    key_secret: String,
}

impl PaymentVerifier {
    /// Create a new verifier
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        orders: Arc<dyn PaymentOrderRepository>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            subscriptions,
            orders,
            key_secret: key_secret.into(),
        }
    }

    /// Check the confirmation signature without touching any state
    pub fn check_signature(&self, confirmation: &PaymentConfirmation) -> BillingResult<()> {
        let payload = checkout_payload(&confirmation.order_id, &confirmation.payment_id);
        if verify(payload.as_bytes(), &confirmation.signature, &self.key_secret) {
            Ok(())
        } else {
            warn!(order_id = %confirmation.order_id, "Payment signature mismatch");
            metrics::counter!("billing_payments_verified_total", "result" => "invalid_signature")
                .increment(1);
            Err(BillingError::InvalidSignature)
        }
    }

    /// Check the signature and mark the confirmed order redeemed.
    ///
    /// The order must belong to `user_id` and have been opened for `claimed`.
    /// A second confirmation for the same order is `AlreadyProcessed`.
    pub async fn redeem(
        &self,
        user_id: &UserId,
        confirmation: &PaymentConfirmation,
        claimed: Purchase,
        now: DateTime<Utc>,
    ) -> BillingResult<()> {
        self.check_signature(confirmation)?;

        let order = self
            .orders
            .find_by_order_id(&confirmation.order_id)
            .await?
            .ok_or_else(|| {
                BillingError::InvalidPurchase(format!("unknown order: {}", confirmation.order_id))
            })?;

        if let Err(e) = check_claim(&order, user_id, claimed) {
            warn!(user_id = %user_id, error = %e, "Confirmation does not match order");
            metrics::counter!("billing_payments_verified_total", "result" => "order_mismatch")
                .increment(1);
            return Err(e);
        }

        if !self
            .orders
            .redeem(&confirmation.order_id, &confirmation.payment_id, now)
            .await?
        {
            warn!(payment_id = %confirmation.payment_id, "Order already redeemed");
            return Err(BillingError::AlreadyProcessed);
        }
        Ok(())
    }

    /// Reopen an order whose redemption could not be applied
    pub async fn release(&self, order_id: &str) {
        if let Err(e) = self.orders.release(order_id).await {
            warn!(order_id, error = %e, "Failed to release order redemption");
        }
    }

    /// Verify a subscription payment and upgrade the user for one plan period
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.order_id))]
    pub async fn verify(
        &self,
        user_id: &UserId,
        confirmation: &PaymentConfirmation,
        tier: Tier,
        plan_type: PlanType,
        now: DateTime<Utc>,
    ) -> BillingResult<Subscription> {
        if tier != Tier::Pro {
            return Err(BillingError::InvalidTier(tier.to_string()));
        }
        self.redeem(user_id, confirmation, Purchase::Subscription { tier, plan_type }, now)
            .await?;

        let (row, billing, period_end) =
            match self.upgrade(user_id, confirmation, tier, plan_type, now).await {
                Ok(applied) => applied,
                Err(e) => {
                    self.release(&confirmation.order_id).await;
                    return Err(e);
                }
            };

        metrics::counter!("billing_payments_verified_total", "result" => "upgraded").increment(1);
        info!(
            user_id = %user_id,
            tier = %tier,
            plan_type = %plan_type,
            period_end = %period_end,
            "Subscription payment verified"
        );

        let mut updated = row;
        updated.set_billing(&billing);
        Ok(resolve_subscription(&updated, now))
    }

    async fn upgrade(
        &self,
        user_id: &UserId,
        confirmation: &PaymentConfirmation,
        tier: Tier,
        plan_type: PlanType,
        now: DateTime<Utc>,
    ) -> BillingResult<(SubscriptionRow, BillingFields, DateTime<Utc>)> {
        let row = self
            .subscriptions
            .get_or_create(user_id.0, now.date_naive())
            .await?;

        let period_end = now
            .checked_add_months(Months::new(plan_type.months()))
            .ok_or_else(|| BillingError::Internal("period end out of range".to_string()))?;

        let mut billing = row.billing();
        billing.tier = tier.as_str().to_string();
        billing.status = SubscriptionStatus::Active.as_str().to_string();
        billing.plan_type = Some(plan_type.as_str().to_string());
        billing.current_period_start = Some(now);
        billing.current_period_end = Some(period_end);
        billing.grace_period_end = None;
        billing.razorpay_order_id = Some(confirmation.order_id.clone());

        self.subscriptions.update_billing(user_id.0, &billing).await?;
        Ok((row, billing, period_end))
    }
}
