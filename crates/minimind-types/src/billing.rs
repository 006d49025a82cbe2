//! Payment products and pricing

use serde::{Deserialize, Serialize};

use crate::{ParseError, PlanType, Tier};

/// Price of a pro subscription in the smallest currency unit (paise)
pub const fn plan_price(plan: PlanType) -> u64 {
    match plan {
        PlanType::Monthly => 19_900,
        PlanType::Yearly => 199_900,
    }
}

/// One-off credit top-up products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopUpProduct {
    /// 50 bonus credits
    #[serde(rename = "credits_50")]
    Credits50,
    /// 150 bonus credits
    #[serde(rename = "credits_150")]
    Credits150,
}

impl TopUpProduct {
    /// Product identifier sent by the client
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Credits50 => "credits_50",
            Self::Credits150 => "credits_150",
        }
    }

    /// Credits granted on purchase
    pub const fn credits(&self) -> u32 {
        match self {
            Self::Credits50 => 50,
            Self::Credits150 => 150,
        }
    }

    /// Price in paise
    pub const fn price(&self) -> u64 {
        match self {
            Self::Credits50 => 4_900,
            Self::Credits150 => 9_900,
        }
    }
}

impl std::fmt::Display for TopUpProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for TopUpProduct {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credits_50" => Ok(Self::Credits50),
            "credits_150" => Ok(Self::Credits150),
            _ => Err(ParseError::Product(s.to_string())),
        }
    }
}

/// What an order is paying for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Purchase {
    /// Tier upgrade for one plan period
    Subscription {
        /// Tier being bought
        tier: Tier,
        /// Billing interval
        plan_type: PlanType,
    },
    /// One-off credit pack
    TopUp {
        /// Product being bought
        product: TopUpProduct,
    },
}

impl Purchase {
    /// Amount to charge in paise
    pub const fn amount(&self) -> u64 {
        match self {
            Self::Subscription { plan_type, .. } => plan_price(*plan_type),
            Self::TopUp { product } => product.price(),
        }
    }
}

/// Order created with the payment provider, ready for client checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    /// Provider order ID
    pub order_id: String,
    /// Amount in paise
    pub amount: u64,
    /// ISO currency code
    pub currency: String,
    /// Public key the client opens checkout with
    pub key_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_amounts() {
        let monthly = Purchase::Subscription {
            tier: Tier::Pro,
            plan_type: PlanType::Monthly,
        };
        let yearly = Purchase::Subscription {
            tier: Tier::Pro,
            plan_type: PlanType::Yearly,
        };
        assert_eq!(monthly.amount(), 19_900);
        assert!(yearly.amount() > monthly.amount());

        let pack = Purchase::TopUp {
            product: TopUpProduct::Credits50,
        };
        assert_eq!(pack.amount(), 4_900);
    }

    #[test]
    fn test_product_parse() {
        assert_eq!(
            "credits_150".parse::<TopUpProduct>().unwrap(),
            TopUpProduct::Credits150
        );
        assert!("credits_9000".parse::<TopUpProduct>().is_err());
    }
}
