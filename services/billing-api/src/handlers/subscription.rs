//! Subscription handlers

use axum::extract::State;
use axum::Json;
use std::time::Instant;

use minimind_billing_core::SubscriptionView;

use super::shared::record_op_duration;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/v1/subscription
///
/// Returns the subscription with the effective tier resolved and the
/// features that tier lacks.
pub async fn get_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SubscriptionView>> {
    let start = Instant::now();

    let result = state.billing.get_subscription(&auth.user_id).await;
    record_op_duration("get_subscription", start, result.is_ok());

    Ok(Json(result?))
}
