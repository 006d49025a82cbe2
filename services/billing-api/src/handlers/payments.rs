//! Payment handlers: order creation and checkout confirmation

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use minimind_billing_core::{BillingError, PaymentConfirmation, TopUpResult};
use minimind_types::{CheckoutOrder, PlanType, Purchase, Tier, TopUpProduct};

use super::shared::{record_op_duration, validate_string_length};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// `{tier, planType}` for a plan, `{productId}` for a credit pack
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub tier: Option<String>,
    pub plan_type: Option<String>,
    pub product_id: Option<String>,
}

impl CreateOrderRequest {
    fn purchase(&self) -> ApiResult<Purchase> {
        match (&self.product_id, &self.tier) {
            (Some(product), _) => Ok(Purchase::TopUp {
                product: parse_product(product)?,
            }),
            (None, Some(tier)) => {
                let plan_type = self
                    .plan_type
                    .as_deref()
                    .ok_or_else(|| ApiError::BadRequest("planType is required".into()))?;
                Ok(Purchase::Subscription {
                    tier: parse_tier(tier)?,
                    plan_type: parse_plan(plan_type)?,
                })
            }
            (None, None) => Err(ApiError::BadRequest(
                "Either tier and planType or productId is required".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub tier: String,
    pub plan_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub tier: Tier,
    pub plan_type: Option<PlanType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTopUpRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTopUpResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TopUpResult,
}

fn parse_tier(value: &str) -> ApiResult<Tier> {
    value
        .parse()
        .map_err(|e| ApiError::from(BillingError::from(e)))
}

fn parse_plan(value: &str) -> ApiResult<PlanType> {
    value
        .parse()
        .map_err(|e| ApiError::from(BillingError::from(e)))
}

fn parse_product(value: &str) -> ApiResult<TopUpProduct> {
    value
        .parse()
        .map_err(|e| ApiError::from(BillingError::from(e)))
}

fn confirmation(order_id: &str, payment_id: &str, signature: &str) -> ApiResult<PaymentConfirmation> {
    validate_string_length(order_id, "orderId")?;
    validate_string_length(payment_id, "paymentId")?;
    validate_string_length(signature, "signature")?;
    Ok(PaymentConfirmation {
        order_id: order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: signature.to_string(),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/payments/orders
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateOrderRequest>,
) -> ApiResult<Json<CheckoutOrder>> {
    let start = Instant::now();

    let purchase = req.purchase()?;
    let result = state.billing.create_order(&auth.user_id, purchase).await;
    record_op_duration("create_order", start, result.is_ok());

    let order = result?;
    metrics::counter!("billing_orders_created_total").increment(1);
    tracing::info!(user_id = %auth.user_id, order_id = %order.order_id, "Checkout order created");

    Ok(Json(order))
}

/// POST /api/v1/payments/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let start = Instant::now();

    let confirmation = confirmation(&req.order_id, &req.payment_id, &req.signature)?;
    let tier = parse_tier(&req.tier)?;
    let plan_type = parse_plan(&req.plan_type)?;

    let result = state
        .billing
        .verify_payment(&auth.user_id, &confirmation, tier, plan_type)
        .await;
    record_op_duration("verify_payment", start, result.is_ok());

    let subscription = result?;
    Ok(Json(VerifyPaymentResponse {
        success: true,
        tier: subscription.effective_tier,
        plan_type: subscription.plan_type,
    }))
}

/// POST /api/v1/payments/topup/verify
pub async fn verify_top_up(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<VerifyTopUpRequest>,
) -> ApiResult<Json<VerifyTopUpResponse>> {
    let start = Instant::now();

    let confirmation = confirmation(&req.order_id, &req.payment_id, &req.signature)?;
    let product = parse_product(&req.product_id)?;

    let result = state
        .billing
        .verify_top_up(&auth.user_id, &confirmation, product)
        .await;
    record_op_duration("verify_top_up", start, result.is_ok());

    Ok(Json(VerifyTopUpResponse {
        success: true,
        result: result?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_request(tier: Option<&str>, plan: Option<&str>, product: Option<&str>) -> CreateOrderRequest {
        CreateOrderRequest {
            tier: tier.map(str::to_string),
            plan_type: plan.map(str::to_string),
            product_id: product.map(str::to_string),
        }
    }

    #[test]
    fn test_purchase_from_plan() {
        let purchase = order_request(Some("pro"), Some("yearly"), None)
            .purchase()
            .unwrap();
        assert_eq!(
            purchase,
            Purchase::Subscription {
                tier: Tier::Pro,
                plan_type: PlanType::Yearly
            }
        );
    }

    #[test]
    fn test_purchase_from_product() {
        let purchase = order_request(None, None, Some("credits_50")).purchase().unwrap();
        assert_eq!(
            purchase,
            Purchase::TopUp {
                product: TopUpProduct::Credits50
            }
        );
    }

    #[test]
    fn test_purchase_rejects_incomplete_or_unknown() {
        assert!(order_request(Some("pro"), None, None).purchase().is_err());
        assert!(order_request(None, None, None).purchase().is_err());
        assert!(order_request(Some("gold"), Some("monthly"), None)
            .purchase()
            .is_err());
        assert!(order_request(None, None, Some("credits_9000"))
            .purchase()
            .is_err());
    }
}
