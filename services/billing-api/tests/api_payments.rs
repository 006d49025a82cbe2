//! Order creation and checkout confirmation through the router

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{TestApp, KEY_ID, KEY_SECRET};
use minimind_billing_core::signature::{checkout_payload, sign};
use minimind_billing_core::{BillingConfig, RazorpayProvider};
use minimind_types::UserId;

fn checkout_signature(order_id: &str, payment_id: &str) -> String {
    sign(checkout_payload(order_id, payment_id).as_bytes(), KEY_SECRET).unwrap()
}

async fn razorpay_app(server: &MockServer) -> TestApp {
    let config = BillingConfig::new(KEY_ID, KEY_SECRET, common::WEBHOOK_SECRET)
        .with_api_base(format!("{}/v1", server.uri()));
    TestApp::with_provider(Arc::new(RazorpayProvider::new(config).unwrap()))
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_create_subscription_order() {
    let app = TestApp::new();
    let user = app.free_user(0);

    let (status, body) = app
        .post(
            "/api/v1/payments/orders",
            Some(&user),
            json!({ "tier": "pro", "planType": "monthly" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], "order_static1");
    assert_eq!(body["amount"], 19_900);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["keyId"], KEY_ID);

    let row = app.row(&user);
    assert_eq!(row.razorpay_order_id.as_deref(), Some("order_static1"));
    assert_eq!(row.status, "pending");

    let order = app.orders.get("order_static1").unwrap();
    assert_eq!(order.user_id, user.0);
    assert_eq!(order.plan_type.as_deref(), Some("monthly"));
}

#[tokio::test]
async fn test_create_top_up_order() {
    let app = TestApp::new();
    let user = UserId::new();

    let (status, body) = app
        .post(
            "/api/v1/payments/orders",
            Some(&user),
            json!({ "productId": "credits_150" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 9_900);
}

#[tokio::test]
async fn test_order_for_unknown_or_free_tier_is_rejected() {
    let app = TestApp::new();
    let user = UserId::new();

    for body in [
        json!({ "tier": "free", "planType": "monthly" }),
        json!({ "tier": "gold", "planType": "monthly" }),
        json!({ "tier": "pro" }),
        json!({ "productId": "credits_9000" }),
    ] {
        let (status, _) = app
            .post("/api/v1/payments/orders", Some(&user), body.clone())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_order_through_razorpay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_rzp123",
            "entity": "order",
            "amount": 199_900,
            "currency": "INR",
            "status": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = razorpay_app(&server).await;
    let user = UserId::new();

    let (status, body) = app
        .post(
            "/api/v1/payments/orders",
            Some(&user),
            json!({ "tier": "pro", "planType": "yearly" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], "order_rzp123");
    assert_eq!(body["amount"], 199_900);
}

#[tokio::test]
async fn test_provider_failures_map_to_status_codes() {
    let cases = [
        (429, StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        (402, StatusCode::PAYMENT_REQUIRED, "QUOTA_EXCEEDED"),
        (500, StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
    ];

    for (upstream, expected, code) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .respond_with(ResponseTemplate::new(upstream).set_body_json(json!({
                "error": { "code": "BAD_REQUEST_ERROR", "description": "internal detail" }
            })))
            .mount(&server)
            .await;
        let app = razorpay_app(&server).await;

        let (status, body) = app
            .post(
                "/api/v1/payments/orders",
                Some(&UserId::new()),
                json!({ "productId": "credits_50" }),
            )
            .await;

        assert_eq!(status, expected);
        assert_eq!(body["code"], code);
        assert!(!body["error"].as_str().unwrap().contains("internal detail"));
    }
}

// ============================================================================
// Confirmation
// ============================================================================

fn confirmation(order_id: &str, payment_id: &str) -> serde_json::Value {
    json!({
        "orderId": order_id,
        "paymentId": payment_id,
        "signature": checkout_signature(order_id, payment_id),
    })
}

fn with_fields(mut body: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    body
}

#[tokio::test]
async fn test_verify_payment_upgrades_user() {
    let app = TestApp::new();
    let user = app.free_user(10);
    let order_id = app
        .open_order(&user, json!({ "tier": "pro", "planType": "monthly" }))
        .await;

    let (status, body) = app
        .post(
            "/api/v1/payments/verify",
            Some(&user),
            with_fields(
                confirmation(&order_id, "pay_xyz"),
                json!({ "tier": "pro", "planType": "monthly" }),
            ),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["planType"], "monthly");

    let (_, credits) = app.get("/api/v1/credits", Some(&user)).await;
    assert_eq!(credits["tier"], "pro");
    assert_eq!(credits["dailyLimit"], 100);
}

#[tokio::test]
async fn test_verify_payment_replay_is_conflict() {
    let app = TestApp::new();
    let user = app.free_user(0);
    let order_id = app
        .open_order(&user, json!({ "tier": "pro", "planType": "monthly" }))
        .await;
    let request = with_fields(
        confirmation(&order_id, "pay_xyz"),
        json!({ "tier": "pro", "planType": "monthly" }),
    );

    let (status, _) = app
        .post("/api/v1/payments/verify", Some(&user), request.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    let period_end = app.row(&user).current_period_end;

    let (status, body) = app
        .post("/api/v1/payments/verify", Some(&user), request)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_PROCESSED");
    assert_eq!(app.row(&user).current_period_end, period_end);
}

#[tokio::test]
async fn test_verify_payment_must_match_order() {
    let app = TestApp::new();
    let user = app.free_user(0);
    let monthly = app
        .open_order(&user, json!({ "tier": "pro", "planType": "monthly" }))
        .await;
    let pack = app
        .open_order(&user, json!({ "productId": "credits_50" }))
        .await;

    for order_id in [&monthly, &pack] {
        let (status, body) = app
            .post(
                "/api/v1/payments/verify",
                Some(&user),
                with_fields(
                    confirmation(order_id, "pay_xyz"),
                    json!({ "tier": "pro", "planType": "yearly" }),
                ),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{order_id}");
        assert_eq!(body["code"], "BAD_REQUEST");
    }
    assert_eq!(app.row(&user).tier, "free");

    let (status, _) = app
        .post(
            "/api/v1/payments/topup/verify",
            Some(&user),
            with_fields(
                confirmation(&pack, "pay_pack"),
                json!({ "productId": "credits_150" }),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.row(&user).credits_bonus, 0);
}

#[tokio::test]
async fn test_verify_payment_for_another_users_order() {
    let app = TestApp::new();
    let alice = app.free_user(0);
    let bob = app.free_user(0);
    let order_id = app
        .open_order(&alice, json!({ "tier": "pro", "planType": "monthly" }))
        .await;

    let (status, _) = app
        .post(
            "/api/v1/payments/verify",
            Some(&bob),
            with_fields(
                confirmation(&order_id, "pay_xyz"),
                json!({ "tier": "pro", "planType": "monthly" }),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.row(&bob).tier, "free");
}

#[tokio::test]
async fn test_verify_payment_with_bad_signature() {
    let app = TestApp::new();
    let user = app.free_user(0);
    let order_id = app
        .open_order(&user, json!({ "tier": "pro", "planType": "monthly" }))
        .await;

    let (status, body) = app
        .post(
            "/api/v1/payments/verify",
            Some(&user),
            json!({
                "orderId": order_id,
                "paymentId": "pay_xyz",
                "signature": checkout_signature(&order_id, "pay_other"),
                "tier": "pro",
                "planType": "monthly"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SIGNATURE");
    assert_eq!(app.row(&user).tier, "free");
}

#[tokio::test]
async fn test_top_up_applies_once() {
    let app = TestApp::new();
    let user = app.free_user(15);
    let order_id = app
        .open_order(&user, json!({ "productId": "credits_50" }))
        .await;
    let request = with_fields(
        confirmation(&order_id, "pay_pack"),
        json!({ "productId": "credits_50" }),
    );

    let (status, body) = app
        .post("/api/v1/payments/topup/verify", Some(&user), request.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["creditsAdded"], 50);
    assert_eq!(body["bonus"], 50);

    let (status, body) = app
        .post("/api/v1/payments/topup/verify", Some(&user), request)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_PROCESSED");
    assert_eq!(app.row(&user).credits_bonus, 50);

    // Bonus covers spends once the daily pool is gone
    let (_, spent) = app
        .post("/api/v1/credits/use", Some(&user), json!({ "feature": "mastery" }))
        .await;
    assert_eq!(spent["success"], true);
    assert_eq!(spent["credits"]["bonus"], 47);
}

#[tokio::test]
async fn test_confirmation_fields_are_required() {
    let app = TestApp::new();
    let user = UserId::new();

    let (status, _) = app
        .post(
            "/api/v1/payments/topup/verify",
            Some(&user),
            json!({
                "orderId": "",
                "paymentId": "pay_pack",
                "signature": "00",
                "productId": "credits_50"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/v1/payments/verify",
            Some(&user),
            json!({ "orderId": "order_abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
