//! Router wired to in-memory repositories

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use minimind_billing_api::{build_router, AppState, Config};
use minimind_billing_core::signature::sign;
use minimind_billing_core::{
    BillingError, BillingService, OrderRequest, PaymentProvider, ProviderOrder,
};
use minimind_db::memory::{
    MemoryPaymentOrderRepository, MemorySubscriptionRepository, MemoryWebhookEventRepository,
};
use minimind_db::SubscriptionRow;
use minimind_types::UserId;

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const JWT_SECRET: &str = "test_jwt_secret";

/// Provider that numbers its orders `order_static1`, `order_static2`, ...
#[derive(Default)]
pub struct StaticProvider {
    opened: AtomicUsize,
}

#[async_trait]
impl PaymentProvider for StaticProvider {
    async fn create_order(&self, order: &OrderRequest) -> Result<ProviderOrder, BillingError> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProviderOrder {
            id: format!("order_static{n}"),
            amount: order.amount,
            currency: order.currency.clone(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub subscriptions: MemorySubscriptionRepository,
    pub events: MemoryWebhookEventRepository,
    pub orders: MemoryPaymentOrderRepository,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::build(&[], Arc::new(StaticProvider::default()))
    }

    pub fn with_env(extra: &[(&str, &str)]) -> Self {
        Self::build(extra, Arc::new(StaticProvider::default()))
    }

    pub fn with_provider(provider: Arc<dyn PaymentProvider>) -> Self {
        Self::build(&[], provider)
    }

    fn build(extra: &[(&str, &str)], provider: Arc<dyn PaymentProvider>) -> Self {
        let mut env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://unused"),
            ("RAZORPAY_KEY_ID", KEY_ID),
            ("RAZORPAY_KEY_SECRET", KEY_SECRET),
            ("RAZORPAY_WEBHOOK_SECRET", WEBHOOK_SECRET),
            ("SUPABASE_JWT_SECRET", JWT_SECRET),
            ("METRICS_ENABLED", "false"),
        ]);
        env.extend(extra.iter().copied());
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        let subscriptions = MemorySubscriptionRepository::new();
        let events = MemoryWebhookEventRepository::new();
        let orders = MemoryPaymentOrderRepository::new();
        let billing = BillingService::new(
            Arc::new(subscriptions.clone()),
            Arc::new(events.clone()),
            Arc::new(orders.clone()),
            provider,
            config.billing.clone(),
            config.ledger,
        );
        let router = build_router(AppState::new(billing, None, config), None);

        Self {
            router,
            subscriptions,
            events,
            orders,
        }
    }

    /// Seed a free user with credits already spent today
    pub fn free_user(&self, daily_used: i32) -> UserId {
        let user = UserId::new();
        let mut row = SubscriptionRow::new_free(user.0, Utc::now());
        row.credits_daily_used = daily_used;
        self.subscriptions.insert(row);
        user
    }

    /// Seed a pro user whose paid period ends at `period_end`
    pub fn pro_user(&self, period_end: DateTime<Utc>) -> UserId {
        let now = Utc::now();
        let user = UserId::new();
        let mut row = SubscriptionRow::new_free(user.0, now);
        row.tier = "pro".to_string();
        row.plan_type = Some("monthly".to_string());
        row.current_period_start = Some(now);
        row.current_period_end = Some(period_end);
        self.subscriptions.insert(row);
        user
    }

    /// Open an order through the API and return its ID
    pub async fn open_order(&self, user: &UserId, body: Value) -> String {
        let (status, reply) = self.post("/api/v1/payments/orders", Some(user), body).await;
        assert_eq!(status, StatusCode::OK, "{reply}");
        reply["orderId"].as_str().unwrap().to_string()
    }

    pub fn row(&self, user: &UserId) -> SubscriptionRow {
        self.subscriptions.get(user.0).expect("row exists")
    }

    pub async fn get(&self, path: &str, user: Option<&UserId>) -> (StatusCode, Value) {
        send(&self.router, Method::GET, path, user, None).await
    }

    pub async fn post(&self, path: &str, user: Option<&UserId>, body: Value) -> (StatusCode, Value) {
        send(&self.router, Method::POST, path, user, Some(body)).await
    }
}

/// HS256 access token the way Supabase issues them
pub fn bearer(user: &UserId) -> String {
    let claims = json!({
        "sub": user.to_string(),
        "aud": "authenticated",
        "role": "authenticated",
        "exp": Utc::now().timestamp() + 3600,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

/// Send a JSON request through the router and decode the JSON reply
pub async fn send(
    router: &Router,
    method: Method,
    path: &str,
    user: Option<&UserId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Razorpay-shaped subscription webhook and its signature
pub fn signed_webhook(event: &str, subscription_id: &str, user: &UserId) -> (Vec<u8>, String) {
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
        "created_at": Utc::now().timestamp()
    });
    let bytes = serde_json::to_vec(&body).unwrap();
    let signature = sign(&bytes, WEBHOOK_SECRET).unwrap();
    (bytes, signature)
}
