//! Tier resolution
//!
//! The stored tier is only a claim; what a user actually gets depends on the
//! paid period and any running grace period at the moment of the read. There
//! is no background job: every fetch resolves the tier again.

use chrono::{DateTime, Utc};
use tracing::warn;

use minimind_db::SubscriptionRow;
use minimind_types::{Feature, PlanType, Subscription, SubscriptionStatus, Tier, UserId};

/// Tier the user is entitled to at `now`
pub fn effective_tier(row: &SubscriptionRow, now: DateTime<Utc>) -> Tier {
    let stored = row.tier.parse::<Tier>().unwrap_or_else(|_| {
        warn!(user_id = %row.user_id, tier = %row.tier, "Unknown stored tier, treating as free");
        Tier::Free
    });

    match stored {
        Tier::Free => Tier::Free,
        Tier::Pro => {
            let in_period = row.current_period_end.is_some_and(|end| now < end);
            let in_grace = row.grace_period_end.is_some_and(|grace| now < grace);
            if in_period || in_grace {
                Tier::Pro
            } else {
                Tier::Free
            }
        }
    }
}

/// Whether `feature` is unavailable on `tier`
pub fn is_feature_locked(tier: Tier, feature: Feature) -> bool {
    !tier.limits().allows(feature)
}

/// Features unavailable on `tier`
pub fn locked_features(tier: Tier) -> Vec<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| is_feature_locked(tier, *f))
        .collect()
}

/// Build the caller-facing view of a stored row
pub fn resolve_subscription(row: &SubscriptionRow, now: DateTime<Utc>) -> Subscription {
    let stored_tier = row.tier.parse().unwrap_or(Tier::Free);
    let status = row.status.parse().unwrap_or_else(|_| {
        warn!(user_id = %row.user_id, status = %row.status, "Unknown stored status");
        SubscriptionStatus::Active
    });
    let plan_type = row
        .plan_type
        .as_deref()
        .and_then(|p| p.parse::<PlanType>().ok());

    Subscription {
        user_id: UserId(row.user_id),
        stored_tier,
        effective_tier: effective_tier(row, now),
        status,
        plan_type,
        current_period_start: row.current_period_start,
        current_period_end: row.current_period_end,
        grace_period_end: row.grace_period_end,
    }
}
