//! MiniMind Billing API
//!
//! HTTP service for credits, subscriptions and Razorpay payments.
//!
//! ## REST Endpoints (bearer token required)
//!
//! - `GET /api/v1/credits` - Current credit balance
//! - `POST /api/v1/credits/check` - Check a feature or raw cost without spending
//! - `POST /api/v1/credits/use` - Spend credits for a feature or raw cost
//! - `GET /api/v1/subscription` - Effective subscription and locked features
//! - `POST /api/v1/payments/orders` - Create a Razorpay order
//! - `POST /api/v1/payments/verify` - Confirm a subscription payment
//! - `POST /api/v1/payments/topup/verify` - Confirm a credit pack payment
//!
//! ## Webhooks
//!
//! - `POST /webhooks/razorpay` - Razorpay subscription and payment events
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//! - `GET /metrics` - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use crate::config::{Config, ConfigError};
pub use crate::error::{ApiError, ApiResult};
pub use crate::state::AppState;

/// Build the HTTP router with all routes and middleware
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Credit routes
        .route("/credits", get(handlers::get_credits))
        .route("/credits/check", post(handlers::check_credits))
        .route("/credits/use", post(handlers::use_credits))
        // Subscription routes
        .route("/subscription", get(handlers::get_subscription))
        // Payment routes
        .route("/payments/orders", post(handlers::create_order))
        .route("/payments/verify", post(handlers::verify_payment))
        .route("/payments/topup/verify", post(handlers::verify_top_up));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes =
        Router::new().route("/webhooks/razorpay", post(handlers::razorpay_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

/// Install the Prometheus recorder and describe the service's metrics
pub fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most ops should complete in <100ms; provider calls may take seconds
    let billing_latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5, 5.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("billing_operation_duration_seconds".to_string()),
            billing_latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "billing_credits_spent_total",
        "Credits deducted by effective tier"
    );
    metrics::describe_counter!(
        "billing_payments_verified_total",
        "Checkout confirmations by result"
    );
    metrics::describe_counter!(
        "billing_webhooks_processed_total",
        "Razorpay webhooks by outcome"
    );
    metrics::describe_counter!("billing_orders_created_total", "Razorpay orders created");
    metrics::describe_histogram!(
        "billing_operation_duration_seconds",
        "Billing operation latency in seconds by operation type"
    );

    Ok(handle)
}
