//! Provider orders and the purchases they stand for
//!
//! Every order opened with Razorpay is stored with the user and purchase it
//! was created for. A checkout confirmation may only redeem an order that
//! belongs to the confirming user and matches the purchase being claimed.

use chrono::{DateTime, Utc};
use minimind_db::PaymentOrderRow;
use minimind_types::{Purchase, UserId};

use crate::error::{BillingError, BillingResult};
use crate::provider::ProviderOrder;

const KIND_SUBSCRIPTION: &str = "subscription";
const KIND_TOP_UP: &str = "top_up";

/// Row recording what `order` was opened for
pub fn order_row(
    user_id: &UserId,
    purchase: Purchase,
    order: &ProviderOrder,
    now: DateTime<Utc>,
) -> PaymentOrderRow {
    let (kind, tier, plan_type, product_id) = match purchase {
        Purchase::Subscription { tier, plan_type } => (
            KIND_SUBSCRIPTION,
            Some(tier.as_str().to_string()),
            Some(plan_type.as_str().to_string()),
            None,
        ),
        Purchase::TopUp { product } => (KIND_TOP_UP, None, None, Some(product.id().to_string())),
    };

    PaymentOrderRow {
        order_id: order.id.clone(),
        user_id: user_id.0,
        kind: kind.to_string(),
        tier,
        plan_type,
        product_id,
        amount: i64::try_from(order.amount).unwrap_or(i64::MAX),
        currency: order.currency.clone(),
        payment_id: None,
        redeemed_at: None,
        created_at: now,
    }
}

/// Purchase a stored order was opened for
pub fn order_purchase(row: &PaymentOrderRow) -> BillingResult<Purchase> {
    let corrupt = |what: &str| {
        BillingError::Internal(format!("order {} has invalid {what}", row.order_id))
    };

    match row.kind.as_str() {
        KIND_SUBSCRIPTION => {
            let tier = row
                .tier
                .as_deref()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| corrupt("tier"))?;
            let plan_type = row
                .plan_type
                .as_deref()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| corrupt("plan type"))?;
            Ok(Purchase::Subscription { tier, plan_type })
        }
        KIND_TOP_UP => {
            let product = row
                .product_id
                .as_deref()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| corrupt("product"))?;
            Ok(Purchase::TopUp { product })
        }
        _ => Err(corrupt("kind")),
    }
}

/// Check that `row` may be redeemed by `user_id` for `claimed`.
///
/// An order owned by someone else reads the same as an unknown one.
pub fn check_claim(
    row: &PaymentOrderRow,
    user_id: &UserId,
    claimed: Purchase,
) -> BillingResult<()> {
    if row.user_id != user_id.0 {
        return Err(BillingError::InvalidPurchase(format!(
            "unknown order: {}",
            row.order_id
        )));
    }
    if order_purchase(row)? != claimed {
        return Err(BillingError::InvalidPurchase(
            "order was opened for a different purchase".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimind_types::{PlanType, Tier, TopUpProduct};

    fn provider_order(id: &str, amount: u64) -> ProviderOrder {
        ProviderOrder {
            id: id.to_string(),
            amount,
            currency: "INR".to_string(),
        }
    }

    const MONTHLY: Purchase = Purchase::Subscription {
        tier: Tier::Pro,
        plan_type: PlanType::Monthly,
    };
    const YEARLY: Purchase = Purchase::Subscription {
        tier: Tier::Pro,
        plan_type: PlanType::Yearly,
    };
    const PACK_50: Purchase = Purchase::TopUp {
        product: TopUpProduct::Credits50,
    };
    const PACK_150: Purchase = Purchase::TopUp {
        product: TopUpProduct::Credits150,
    };

    #[test]
    fn test_row_records_purchase() {
        let user = UserId::new();
        let row = order_row(&user, YEARLY, &provider_order("order_1", 199_900), Utc::now());
        assert_eq!(row.kind, "subscription");
        assert_eq!(row.plan_type.as_deref(), Some("yearly"));
        assert_eq!(row.amount, 199_900);
        assert_eq!(order_purchase(&row).unwrap(), YEARLY);

        let row = order_row(&user, PACK_50, &provider_order("order_2", 4_900), Utc::now());
        assert_eq!(row.kind, "top_up");
        assert_eq!(row.product_id.as_deref(), Some("credits_50"));
        assert_eq!(order_purchase(&row).unwrap(), PACK_50);
    }

    #[test]
    fn test_claim_must_match_owner_and_purchase() {
        let alice = UserId::new();
        let bob = UserId::new();
        let monthly = order_row(&alice, MONTHLY, &provider_order("order_m", 19_900), Utc::now());
        let pack = order_row(&alice, PACK_50, &provider_order("order_p", 4_900), Utc::now());

        assert!(check_claim(&monthly, &alice, MONTHLY).is_ok());
        assert!(check_claim(&pack, &alice, PACK_50).is_ok());

        for (row, user, claimed) in [
            (&monthly, &bob, MONTHLY),
            (&monthly, &alice, YEARLY),
            (&pack, &alice, YEARLY),
            (&pack, &alice, PACK_150),
            (&monthly, &alice, PACK_50),
        ] {
            assert!(
                matches!(
                    check_claim(row, user, claimed),
                    Err(BillingError::InvalidPurchase(_))
                ),
                "{claimed:?}"
            );
        }
    }

    #[test]
    fn test_corrupt_row_is_internal() {
        let order = provider_order("order_x", 4_900);
        let mut row = order_row(&UserId::new(), PACK_50, &order, Utc::now());
        row.product_id = Some("credits_9000".to_string());
        assert!(matches!(order_purchase(&row), Err(BillingError::Internal(_))));
    }
}
