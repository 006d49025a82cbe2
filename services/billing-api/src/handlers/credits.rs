//! Credit handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use minimind_billing_core::{CreditCheck, CreditSpend};
use minimind_types::CreditStatus;

use super::shared::{parse_feature, record_op_duration, validate_cost, validate_label};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Either a feature (priced from the cost table) or a raw amount
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCheckRequest {
    pub feature: Option<String>,
    pub cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCreditsRequest {
    pub feature: Option<String>,
    pub cost: Option<u32>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCreditsResponse {
    pub success: bool,
    pub cost: u32,
    pub credits: CreditStatus,
}

impl From<CreditSpend> for UseCreditsResponse {
    fn from(spend: CreditSpend) -> Self {
        Self {
            success: spend.success,
            cost: spend.cost,
            credits: spend.status,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/credits
pub async fn get_credits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CreditStatus>> {
    let start = Instant::now();

    let result = state.billing.credit_status(&auth.user_id).await;
    record_op_duration("get_credits", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/credits/check
pub async fn check_credits(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreditCheckRequest>,
) -> ApiResult<Json<CreditCheck>> {
    let start = Instant::now();

    let result = match (req.feature.as_deref(), req.cost) {
        (Some(feature), _) => {
            let feature = parse_feature(feature)?;
            state
                .billing
                .check_feature(&auth.user_id, feature)
                .await
                .map_err(ApiError::from)
        }
        (None, Some(cost)) => {
            validate_cost(cost)?;
            check_raw_cost(&state, &auth, cost).await
        }
        (None, None) => Err(ApiError::BadRequest(
            "Either feature or cost is required".into(),
        )),
    };
    record_op_duration("check_credits", start, result.is_ok());

    Ok(Json(result?))
}

async fn check_raw_cost(state: &AppState, auth: &AuthUser, cost: u32) -> ApiResult<CreditCheck> {
    let allowed = state.billing.has_credits(&auth.user_id, cost).await?;
    let status = state.billing.credit_status(&auth.user_id).await?;
    Ok(CreditCheck {
        allowed,
        cost,
        available: status.available,
        locked: false,
    })
}

/// POST /api/v1/credits/use
///
/// An over-budget spend is not an error: it answers `success: false` with
/// the unchanged balance.
pub async fn use_credits(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<UseCreditsRequest>,
) -> ApiResult<Json<UseCreditsResponse>> {
    let start = Instant::now();

    if let Some(label) = req.label.as_deref() {
        validate_label(label)?;
    }

    let result = match (req.feature.as_deref(), req.cost) {
        (Some(feature), _) => {
            let feature = parse_feature(feature)?;
            state
                .billing
                .use_feature(&auth.user_id, feature, req.label.as_deref())
                .await
                .map_err(ApiError::from)
        }
        (None, Some(cost)) => {
            validate_cost(cost)?;
            let label = req
                .label
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("label is required with cost".into()))?;
            state
                .billing
                .use_credits(&auth.user_id, cost, label)
                .await
                .map_err(ApiError::from)
        }
        (None, None) => Err(ApiError::BadRequest(
            "Either feature or cost is required".into(),
        )),
    };
    record_op_duration("use_credits", start, result.is_ok());

    let spend = result?;
    if !spend.success {
        tracing::info!(user_id = %auth.user_id, cost = spend.cost, "Spend refused, insufficient credits");
    }

    Ok(Json(spend.into()))
}
