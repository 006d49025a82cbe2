//! Liveness and readiness

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
    /// `test` or `live`, from the Razorpay key ID
    pub payments: &'static str,
    pub early_access: bool,
}

/// Always OK while the process is up
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once the subscription store answers
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    let database = match &state.pool {
        None => "not_configured",
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "connected",
            Err(e) => {
                tracing::error!(error = ?e, "Subscription store unreachable");
                return Err(StatusCode::SERVICE_UNAVAILABLE);
            }
        },
    };

    Ok(Json(ReadyResponse {
        status: "ready",
        database,
        payments: if state.config.billing.is_test_mode() {
            "test"
        } else {
            "live"
        },
        early_access: state.config.ledger.early_access,
    }))
}
