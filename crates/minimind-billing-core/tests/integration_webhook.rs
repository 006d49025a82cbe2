//! Integration tests for Razorpay webhook processing

mod common;

use chrono::{Duration, Months, Utc};
use common::{webhook_body, Harness, WEBHOOK_SECRET};
use minimind_billing_core::signature::sign;
use minimind_billing_core::{effective_tier, BillingError, WebhookOutcome};
use minimind_types::{Tier, UserId};
use serde_json::json;

fn link_subscription(h: &Harness, user: &UserId, subscription_id: &str) {
    let mut row = h.row(user);
    row.razorpay_subscription_id = Some(subscription_id.to_string());
    h.subscriptions.insert(row);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let h = Harness::new();
    let user = h.free_user(Utc::now(), 0);
    let (body, _) = webhook_body("subscription.charged", "sub_1", &user);

    let result = h.service.process_webhook(&body, None, Some("evt_1")).await;
    assert!(matches!(result, Err(BillingError::WebhookError(_))));
    assert_eq!(h.row(&user).tier, "free");
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let h = Harness::new();
    let user = h.free_user(Utc::now(), 0);
    let (body, signature) = webhook_body("subscription.cancelled", "sub_1", &user);
    let tampered = String::from_utf8(body)
        .unwrap()
        .replace("cancelled", "charged")
        .into_bytes();

    let result = h
        .service
        .process_webhook(&tampered, Some(&signature), Some("evt_1"))
        .await;
    assert!(matches!(result, Err(BillingError::WebhookError(_))));
    assert_eq!(h.row(&user).tier, "free");
}

#[tokio::test]
async fn test_charged_upgrades_user_found_by_note() {
    let h = Harness::new();
    let now = Utc::now();
    let user = h.free_user(now, 0);
    let (body, signature) = webhook_body("subscription.charged", "sub_new", &user);

    let outcome = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_charge"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let row = h.row(&user);
    assert_eq!(row.tier, "pro");
    assert_eq!(row.status, "active");
    assert_eq!(row.plan_type.as_deref(), Some("monthly"));
    assert_eq!(row.razorpay_subscription_id.as_deref(), Some("sub_new"));
    assert_eq!(effective_tier(&row, Utc::now()), Tier::Pro);
}

#[tokio::test]
async fn test_replayed_charge_extends_once() {
    let h = Harness::new();
    let now = Utc::now();
    let end = now + Duration::days(5);
    let user = h.pro_user(now, end);
    link_subscription(&h, &user, "sub_1");
    let (body, signature) = webhook_body("subscription.charged", "sub_1", &user);

    let first = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_same"))
        .await
        .unwrap();
    let second = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_same"))
        .await
        .unwrap();

    assert_eq!(first, WebhookOutcome::Applied);
    assert_eq!(second, WebhookOutcome::Duplicate);
    assert_eq!(
        h.row(&user).current_period_end,
        end.checked_add_months(Months::new(1))
    );
}

#[tokio::test]
async fn test_replay_without_event_id_header_uses_derived_id() {
    let h = Harness::new();
    let now = Utc::now();
    let user = h.pro_user(now, now + Duration::days(5));
    link_subscription(&h, &user, "sub_1");
    let (body, signature) = webhook_body("subscription.charged", "sub_1", &user);

    h.service
        .process_webhook(&body, Some(&signature), None)
        .await
        .unwrap();
    let end_after_first = h.row(&user).current_period_end;

    let second = h
        .service
        .process_webhook(&body, Some(&signature), None)
        .await
        .unwrap();
    assert_eq!(second, WebhookOutcome::Duplicate);
    assert_eq!(h.row(&user).current_period_end, end_after_first);
}

#[tokio::test]
async fn test_cancel_then_expire_respects_grace() {
    let h = Harness::new();
    let t = Utc::now();
    let user = h.pro_user(t - Duration::days(30), t);
    link_subscription(&h, &user, "sub_1");
    let handler = h.webhooks();

    let (body, signature) = webhook_body("subscription.cancelled", "sub_1", &user);
    let cancelled = handler
        .verify_and_parse(&body, Some(&signature), Some("evt_cancel"))
        .unwrap();
    handler.process(&cancelled, t).await.unwrap();
    let row = h.row(&user);
    assert_eq!(row.status, "cancelled");
    assert_eq!(row.grace_period_end, Some(t + Duration::days(7)));

    let (body, signature) = webhook_body("subscription.expired", "sub_1", &user);
    let early = handler
        .verify_and_parse(&body, Some(&signature), Some("evt_expire_1"))
        .unwrap();
    let outcome = handler.process(&early, t + Duration::days(3)).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Unchanged);
    assert_eq!(h.row(&user).tier, "pro");
    assert_eq!(effective_tier(&h.row(&user), t + Duration::days(3)), Tier::Pro);

    let late = handler
        .verify_and_parse(&body, Some(&signature), Some("evt_expire_2"))
        .unwrap();
    let outcome = handler.process(&late, t + Duration::days(8)).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);
    let row = h.row(&user);
    assert_eq!(row.tier, "free");
    assert_eq!(row.status, "expired");
    assert!(row.plan_type.is_none());
}

#[tokio::test]
async fn test_charge_after_cancel_reactivates() {
    let h = Harness::new();
    let t = Utc::now();
    let user = h.pro_user(t - Duration::days(20), t + Duration::days(10));
    link_subscription(&h, &user, "sub_1");

    for (event, id) in [
        ("subscription.cancelled", "evt_1"),
        ("subscription.charged", "evt_2"),
    ] {
        let (body, signature) = webhook_body(event, "sub_1", &user);
        h.service
            .process_webhook(&body, Some(&signature), Some(id))
            .await
            .unwrap();
    }

    let row = h.row(&user);
    assert_eq!(row.status, "active");
    assert!(row.grace_period_end.is_none());
}

#[tokio::test]
async fn test_unknown_event_acknowledged_without_mutation() {
    let h = Harness::new();
    let user = h.free_user(Utc::now(), 0);
    let before = h.row(&user);
    let (body, signature) = webhook_body("refund.processed", "sub_1", &user);

    let outcome = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_refund"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored);
    assert_eq!(h.row(&user), before);
}

#[tokio::test]
async fn test_unmatched_event_acknowledged() {
    let h = Harness::new();
    let stranger = UserId::new();
    let (body, signature) = webhook_body("subscription.charged", "sub_unknown", &stranger);

    let outcome = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_x"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Unmatched);
}

#[tokio::test]
async fn test_payment_events_found_by_order_id() {
    let h = Harness::new();
    let now = Utc::now();
    let user = h.free_user(now, 0);
    let mut row = h.row(&user);
    row.status = "pending".to_string();
    row.razorpay_order_id = Some("order_abc".to_string());
    h.subscriptions.insert(row);

    let body = serde_json::to_vec(&json!({
        "entity": "event",
        "event": "payment.failed",
        "contains": ["payment"],
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_1",
                    "order_id": "order_abc",
                    "customer_id": "cust_9",
                    "notes": []
                }
            }
        },
        "created_at": 1_700_000_100
    }))
    .unwrap();
    let signature = sign(&body, WEBHOOK_SECRET).unwrap();

    let outcome = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_fail"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);
    assert_eq!(h.row(&user).status, "active");
}

#[tokio::test]
async fn test_failed_apply_releases_event_for_retry() {
    let h = Harness::new();
    let now = Utc::now();
    let user = h.pro_user(now, now + Duration::days(5));
    link_subscription(&h, &user, "sub_1");
    let (body, signature) = webhook_body("subscription.cancelled", "sub_1", &user);

    h.subscriptions.set_unavailable(true);
    let failed = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_retry"))
        .await;
    assert!(matches!(failed, Err(BillingError::Database(_))));
    h.subscriptions.set_unavailable(false);

    let retried = h
        .service
        .process_webhook(&body, Some(&signature), Some("evt_retry"))
        .await
        .unwrap();
    assert_eq!(retried, WebhookOutcome::Applied);
    assert_eq!(h.row(&user).status, "cancelled");
}
