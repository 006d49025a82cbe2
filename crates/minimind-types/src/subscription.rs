//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParseError, PlanType, Tier, UserId};

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active (free users are always active)
    Active,
    /// Cancelled; pro access continues through the grace period
    Cancelled,
    /// Paid period and grace period are over
    Expired,
    /// Checkout in flight, payment not yet confirmed
    Pending,
}

impl SubscriptionStatus {
    /// Stable string form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            "pending" => Ok(Self::Pending),
            _ => Err(ParseError::Status(s.to_string())),
        }
    }
}

/// Subscription as seen by callers, with the effective tier already resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// User who owns the subscription
    pub user_id: UserId,
    /// Tier as stored
    pub stored_tier: Tier,
    /// Tier used for gating decisions
    pub effective_tier: Tier,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// Billing interval (None for free)
    pub plan_type: Option<PlanType>,
    /// Current billing period start
    pub current_period_start: Option<DateTime<Utc>>,
    /// Current billing period end
    pub current_period_end: Option<DateTime<Utc>>,
    /// End of the post-cancellation grace period
    pub grace_period_end: Option<DateTime<Utc>>,
}
