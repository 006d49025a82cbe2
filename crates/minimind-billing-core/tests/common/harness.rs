//! Billing service wired to in-memory repositories and a scripted provider

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use minimind_billing_core::signature::{checkout_payload, sign};
use minimind_billing_core::{
    BillingConfig, BillingError, BillingService, CreditLedger, LedgerConfig, OrderRequest,
    PaymentConfirmation, PaymentProvider, ProviderOrder, WebhookHandler,
};
use minimind_db::memory::{
    MemoryPaymentOrderRepository, MemorySubscriptionRepository, MemoryWebhookEventRepository,
};
use minimind_db::SubscriptionRow;
use minimind_types::{Purchase, UserId};
use serde_json::json;

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";

/// Provider that answers from a script and records what it was asked
#[derive(Default)]
pub struct MockProvider {
    pub requests: Mutex<Vec<OrderRequest>>,
    pub fail_with: Mutex<Option<fn() -> BillingError>>,
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, BillingError> {
        if let Some(make_err) = *self.fail_with.lock().unwrap() {
            return Err(make_err());
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(order.clone());
        Ok(ProviderOrder {
            id: format!("order_test{}", requests.len()),
            amount: order.amount,
            currency: order.currency.clone(),
        })
    }
}

pub struct Harness {
    pub subscriptions: MemorySubscriptionRepository,
    pub events: MemoryWebhookEventRepository,
    pub orders: MemoryPaymentOrderRepository,
    pub provider: Arc<MockProvider>,
    pub service: BillingService,
    ledger_config: LedgerConfig,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_ledger(LedgerConfig::default())
    }

    pub fn with_ledger(ledger_config: LedgerConfig) -> Self {
        let subscriptions = MemorySubscriptionRepository::new();
        let events = MemoryWebhookEventRepository::new();
        let orders = MemoryPaymentOrderRepository::new();
        let provider = Arc::new(MockProvider::default());
        let config = BillingConfig::new(KEY_ID, KEY_SECRET, WEBHOOK_SECRET);
        let service = BillingService::new(
            Arc::new(subscriptions.clone()),
            Arc::new(events.clone()),
            Arc::new(orders.clone()),
            provider.clone(),
            config,
            ledger_config,
        );
        Self {
            subscriptions,
            events,
            orders,
            provider,
            service,
            ledger_config,
        }
    }

    /// Ledger over the same store, for tests that control the clock
    pub fn ledger(&self) -> CreditLedger {
        CreditLedger::new(Arc::new(self.subscriptions.clone()), self.ledger_config)
    }

    /// Webhook handler over the same store, for tests that control the clock
    pub fn webhooks(&self) -> WebhookHandler {
        WebhookHandler::new(
            Arc::new(self.subscriptions.clone()),
            Arc::new(self.events.clone()),
            WEBHOOK_SECRET,
        )
    }

    /// Seed a free user with counters already spent today
    pub fn free_user(&self, now: DateTime<Utc>, daily_used: i32) -> UserId {
        let user = UserId::new();
        let mut row = SubscriptionRow::new_free(user.0, now);
        row.credits_daily_used = daily_used;
        self.subscriptions.insert(row);
        user
    }

    /// Seed a pro user whose period ends at `period_end`
    pub fn pro_user(&self, now: DateTime<Utc>, period_end: DateTime<Utc>) -> UserId {
        let user = UserId::new();
        let mut row = SubscriptionRow::new_free(user.0, now);
        row.tier = "pro".to_string();
        row.plan_type = Some("monthly".to_string());
        row.current_period_start = Some(now);
        row.current_period_end = Some(period_end);
        self.subscriptions.insert(row);
        user
    }

    /// Open a checkout order through the service and return its ID
    pub async fn open_order(&self, user: &UserId, purchase: Purchase) -> String {
        self.service
            .create_order(user, purchase)
            .await
            .expect("order opened")
            .order_id
    }

    pub fn row(&self, user: &UserId) -> SubscriptionRow {
        self.subscriptions.get(user.0).expect("row exists")
    }
}

/// Confirmation signed the way Razorpay checkout signs it
#[allow(dead_code)]
pub fn signed_confirmation(order_id: &str, payment_id: &str) -> PaymentConfirmation {
    let payload = checkout_payload(order_id, payment_id);
    PaymentConfirmation {
        order_id: order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: sign(payload.as_bytes(), KEY_SECRET).unwrap(),
    }
}

/// Razorpay-shaped webhook body and its signature
#[allow(dead_code)]
pub fn webhook_body(event: &str, subscription_id: &str, user: &UserId) -> (Vec<u8>, String) {
    let body = json!({
        "entity": "event",
        "account_id": "acc_test",
        "event": event,
        "contains": ["subscription"],
        "payload": {
            "subscription": {
                "entity": {
                    "id": subscription_id,
                    "entity": "subscription",
                    "status": "active",
                    "customer_id": "cust_test",
                    "notes": { "user_id": user.to_string() }
                }
            }
        },
        "created_at": 1_700_000_000
    });
    let bytes = serde_json::to_vec(&body).unwrap();
    let signature = sign(&bytes, WEBHOOK_SECRET).unwrap();
    (bytes, signature)
}
