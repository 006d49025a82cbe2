//! Billing service
//!
//! Facade over the ledger, tier resolver, provider, verifier and webhook
//! handler. Handlers only ever talk to this type.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use minimind_db::{PaymentOrderRepository, SubscriptionRepository, WebhookEventRepository};
use minimind_types::{
    CheckoutOrder, CreditStatus, Feature, PlanType, Purchase, Subscription, SubscriptionStatus,
    Tier, TopUpProduct, UserId,
};

use crate::config::{BillingConfig, LedgerConfig};
use crate::error::{BillingError, BillingResult};
use crate::ledger::{CreditLedger, CreditSpend};
use crate::orders::order_row;
use crate::provider::{OrderRequest, PaymentProvider};
use crate::tier::{is_feature_locked, locked_features, resolve_subscription};
use crate::verifier::{PaymentConfirmation, PaymentVerifier};
use crate::webhook::{WebhookHandler, WebhookOutcome};

/// Answer to "may I run this?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCheck {
    /// Whether the spend would succeed
    pub allowed: bool,
    /// Credits the action costs
    pub cost: u32,
    /// Credits available right now
    pub available: u32,
    /// Feature is not part of the user's tier
    pub locked: bool,
}

/// Subscription with the features the effective tier lacks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    /// Resolved subscription
    #[serde(flatten)]
    pub subscription: Subscription,
    /// Features unavailable on the effective tier
    pub locked_features: Vec<Feature>,
}

/// Credits granted by a verified top-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResult {
    /// Credits added by this purchase
    pub credits_added: u32,
    /// Bonus balance afterwards
    pub bonus: u32,
}

/// Billing service
pub struct BillingService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    orders: Arc<dyn PaymentOrderRepository>,
    provider: Arc<dyn PaymentProvider>,
    ledger: CreditLedger,
    verifier: PaymentVerifier,
    webhooks: WebhookHandler,
    config: BillingConfig,
}

impl BillingService {
    /// Create a new billing service
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        events: Arc<dyn WebhookEventRepository>,
        orders: Arc<dyn PaymentOrderRepository>,
        provider: Arc<dyn PaymentProvider>,
        config: BillingConfig,
        ledger_config: LedgerConfig,
    ) -> Self {
        let ledger = CreditLedger::new(subscriptions.clone(), ledger_config);
        let verifier = PaymentVerifier::new(
            subscriptions.clone(),
            orders.clone(),
            &config.razorpay_key_secret,
        );
        let webhooks =
            WebhookHandler::new(subscriptions.clone(), events, &config.razorpay_webhook_secret);

        Self {
            subscriptions,
            orders,
            provider,
            ledger,
            verifier,
            webhooks,
            config,
        }
    }

    /// Billing configuration
    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Current credit balance
    pub async fn credit_status(&self, user_id: &UserId) -> BillingResult<CreditStatus> {
        self.ledger.credit_status(user_id, Utc::now()).await
    }

    /// Whether `cost` credits could be spent right now
    pub async fn has_credits(&self, user_id: &UserId, cost: u32) -> BillingResult<bool> {
        self.ledger.has_credits(user_id, cost, Utc::now()).await
    }

    /// Deduct a raw credit amount
    pub async fn use_credits(
        &self,
        user_id: &UserId,
        cost: u32,
        label: &str,
    ) -> BillingResult<CreditSpend> {
        self.ledger.use_credits(user_id, cost, label, Utc::now()).await
    }

    /// Check a feature against the tier and the balance without spending
    #[instrument(skip(self))]
    pub async fn check_feature(
        &self,
        user_id: &UserId,
        feature: Feature,
    ) -> BillingResult<CreditCheck> {
        let now = Utc::now();
        let status = self.ledger.credit_status(user_id, now).await?;
        let locked = is_feature_locked(status.tier, feature);
        let cost = feature.cost();

        Ok(CreditCheck {
            allowed: !locked && (status.early_access || cost <= status.available),
            cost,
            available: status.available,
            locked,
        })
    }

    /// Charge for one use of a feature, refusing features the tier lacks
    #[instrument(skip(self))]
    pub async fn use_feature(
        &self,
        user_id: &UserId,
        feature: Feature,
        label: Option<&str>,
    ) -> BillingResult<CreditSpend> {
        let now = Utc::now();
        let sub = self.load_subscription(user_id).await?;
        if is_feature_locked(sub.effective_tier, feature) {
            return Err(BillingError::FeatureLocked(feature));
        }

        self.ledger
            .use_credits(user_id, feature.cost(), label.unwrap_or(feature.as_str()), now)
            .await
    }

    async fn load_subscription(&self, user_id: &UserId) -> BillingResult<Subscription> {
        let now = Utc::now();
        let row = self
            .subscriptions
            .get_or_create(user_id.0, now.date_naive())
            .await?;
        Ok(resolve_subscription(&row, now))
    }

    /// Subscription as the user is entitled to it right now
    pub async fn get_subscription(&self, user_id: &UserId) -> BillingResult<SubscriptionView> {
        let subscription = self.load_subscription(user_id).await?;
        let locked_features = locked_features(subscription.effective_tier);
        Ok(SubscriptionView {
            subscription,
            locked_features,
        })
    }

    /// Open a provider order for a plan or a top-up pack
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        user_id: &UserId,
        purchase: Purchase,
    ) -> BillingResult<CheckoutOrder> {
        if let Purchase::Subscription { tier, .. } = purchase {
            if tier != Tier::Pro {
                return Err(BillingError::InvalidTier(tier.to_string()));
            }
        }

        let mut notes = HashMap::from([("user_id".to_string(), user_id.to_string())]);
        match purchase {
            Purchase::Subscription { tier, plan_type } => {
                notes.insert("tier".to_string(), tier.as_str().to_string());
                notes.insert("plan_type".to_string(), plan_type.as_str().to_string());
            }
            Purchase::TopUp { product } => {
                notes.insert("product_id".to_string(), product.id().to_string());
            }
        }

        let request = OrderRequest {
            amount: purchase.amount(),
            currency: self.config.currency.clone(),
            receipt: format!("rcpt_{}", Uuid::new_v4().simple()),
            notes,
        };
        let order = self.provider.create_order(&request).await?;

        let now = Utc::now();
        self.orders
            .create(&order_row(user_id, purchase, &order, now))
            .await?;

        let row = self
            .subscriptions
            .get_or_create(user_id.0, now.date_naive())
            .await?;
        let mut billing = row.billing();
        billing.razorpay_order_id = Some(order.id.clone());
        let is_subscription = matches!(purchase, Purchase::Subscription { .. });
        if is_subscription && billing.tier == Tier::Free.as_str() {
            billing.status = SubscriptionStatus::Pending.as_str().to_string();
        }
        self.subscriptions.update_billing(user_id.0, &billing).await?;

        info!(order_id = %order.id, amount = order.amount, "Order created");

        Ok(CheckoutOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: self.config.razorpay_key_id.clone(),
        })
    }

    /// Confirm a subscription payment and upgrade the user
    pub async fn verify_payment(
        &self,
        user_id: &UserId,
        confirmation: &PaymentConfirmation,
        tier: Tier,
        plan_type: PlanType,
    ) -> BillingResult<Subscription> {
        self.verifier
            .verify(user_id, confirmation, tier, plan_type, Utc::now())
            .await
    }

    /// Confirm a top-up payment and credit the bonus balance.
    ///
    /// The order must have been opened by this user for `product`, and is
    /// redeemed at most once; a replayed confirmation is refused.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.order_id))]
    pub async fn verify_top_up(
        &self,
        user_id: &UserId,
        confirmation: &PaymentConfirmation,
        product: TopUpProduct,
    ) -> BillingResult<TopUpResult> {
        let now = Utc::now();
        self.verifier
            .redeem(user_id, confirmation, Purchase::TopUp { product }, now)
            .await?;

        let credits = product.credits();
        let bonus = match self.ledger.add_bonus(user_id, credits, now).await {
            Ok(bonus) => bonus,
            Err(e) => {
                self.verifier.release(&confirmation.order_id).await;
                return Err(e);
            }
        };

        metrics::counter!("billing_payments_verified_total", "result" => "top_up").increment(1);
        info!(user_id = %user_id, product = %product, bonus, "Top-up applied");

        Ok(TopUpResult {
            credits_added: credits,
            bonus,
        })
    }

    /// Verify, dedupe and apply a Razorpay webhook delivery
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        event_id: Option<&str>,
    ) -> BillingResult<WebhookOutcome> {
        let event = self.webhooks.verify_and_parse(payload, signature, event_id)?;
        let outcome = self.webhooks.process(&event, Utc::now()).await?;

        metrics::counter!(
            "billing_webhooks_processed_total",
            "outcome" => outcome.as_str()
        )
        .increment(1);

        Ok(outcome)
    }
}
