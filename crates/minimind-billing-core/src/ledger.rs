//! Credit ledger
//!
//! Every user has a daily allowance and, on pro, a monthly pool on top of
//! it. Counters roll over lazily: each read zeroes a counter whose reset date
//! is stale and stamps today. Spends are committed with a compare-and-swap on
//! the counter columns so two concurrent requests can never both spend the
//! same credit.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use minimind_db::{CreditCounters, SubscriptionRepository, SubscriptionRow};
use minimind_types::{CreditStatus, Tier, UserId};

use crate::config::LedgerConfig;
use crate::error::{BillingError, BillingResult};
use crate::tier::effective_tier;

/// Attempts before a contended spend is refused
const MAX_SPEND_ATTEMPTS: usize = 3;

/// Counters after applying any day or month rollover due at `now`
pub fn resolve_credit_state(row: &SubscriptionRow, now: DateTime<Utc>) -> CreditCounters {
    let today = now.date_naive();
    let mut counters = row.counters();

    if counters.last_daily_reset != today {
        counters.daily_used = 0;
        counters.last_daily_reset = today;
    }

    let last = counters.last_monthly_reset;
    if (last.year(), last.month()) != (today.year(), today.month()) {
        counters.monthly_used = 0;
        counters.last_monthly_reset = today;
    }

    counters
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Credits left in the tier's own pools, ignoring bonus credits
pub fn tier_remaining(tier: Tier, counters: &CreditCounters) -> u32 {
    let limits = tier.limits();
    let daily_remaining = limits
        .daily_credits
        .saturating_sub(non_negative(counters.daily_used));

    if !limits.has_monthly_pool() {
        return daily_remaining;
    }

    // Deliberately min(daily, monthly): a pro user never spends past the
    // monthly pool even with daily credits left.
    let monthly_remaining = limits
        .monthly_credits
        .saturating_sub(non_negative(counters.monthly_used));
    daily_remaining.min(monthly_remaining)
}

/// Everything spendable right now
pub fn available_credits(tier: Tier, counters: &CreditCounters) -> u32 {
    tier_remaining(tier, counters).saturating_add(non_negative(counters.bonus))
}

/// Counters after spending `cost`, drawing from tier pools before bonus.
///
/// Returns `None` when `cost` exceeds what is available.
pub fn spend(tier: Tier, counters: &CreditCounters, cost: u32) -> Option<CreditCounters> {
    if cost == 0 || cost > available_credits(tier, counters) {
        return None;
    }

    let from_pool = cost.min(tier_remaining(tier, counters));
    let from_bonus = cost - from_pool;

    let mut next = *counters;
    next.daily_used = to_column(non_negative(next.daily_used) + from_pool);
    if tier.limits().has_monthly_pool() {
        next.monthly_used = to_column(non_negative(next.monthly_used) + from_pool);
    }
    next.bonus = to_column(non_negative(next.bonus) - from_bonus);
    Some(next)
}

/// Result of a spend attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditSpend {
    /// Whether the credits were deducted
    pub success: bool,
    /// Amount requested
    pub cost: u32,
    /// Balance after the attempt
    pub status: CreditStatus,
}

/// Per-user credit ledger backed by the subscription row
#[derive(Clone)]
pub struct CreditLedger {
    subscriptions: Arc<dyn SubscriptionRepository>,
    config: LedgerConfig,
}

impl CreditLedger {
    /// Create a new ledger
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, config: LedgerConfig) -> Self {
        Self {
            subscriptions,
            config,
        }
    }

    /// Whether deduction is bypassed
    pub fn early_access(&self) -> bool {
        self.config.early_access
    }

    fn status(&self, tier: Tier, counters: &CreditCounters) -> CreditStatus {
        let limits = tier.limits();
        CreditStatus {
            available: available_credits(tier, counters),
            daily_used: non_negative(counters.daily_used),
            monthly_used: non_negative(counters.monthly_used),
            daily_limit: limits.daily_credits,
            monthly_limit: limits.monthly_credits,
            bonus: non_negative(counters.bonus),
            tier,
            early_access: self.config.early_access,
        }
    }

    /// Load the row and apply rollovers, persisting them if any were due
    async fn load(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<(SubscriptionRow, CreditCounters)> {
        let mut row = self
            .subscriptions
            .get_or_create(user_id, now.date_naive())
            .await?;
        let resolved = resolve_credit_state(&row, now);

        if resolved != row.counters() {
            match self
                .subscriptions
                .compare_and_swap_credits(user_id, &row.counters(), &resolved)
                .await
            {
                Ok(true) => {
                    debug!(user_id = %user_id, "Credit counters rolled over");
                    row.set_counters(&resolved);
                }
                Ok(false) => {
                    // Someone else wrote first; their row already reflects today.
                    let row = self
                        .subscriptions
                        .get_or_create(user_id, now.date_naive())
                        .await?;
                    let counters = resolve_credit_state(&row, now);
                    return Ok((row, counters));
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to persist credit rollover");
                }
            }
        }

        Ok((row, resolved))
    }

    /// Current balance
    #[instrument(skip(self))]
    pub async fn credit_status(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> BillingResult<CreditStatus> {
        let (row, counters) = self.load(user_id.0, now).await?;
        Ok(self.status(effective_tier(&row, now), &counters))
    }

    /// Whether `cost` credits could be spent right now
    #[instrument(skip(self))]
    pub async fn has_credits(
        &self,
        user_id: &UserId,
        cost: u32,
        now: DateTime<Utc>,
    ) -> BillingResult<bool> {
        if self.config.early_access {
            return Ok(true);
        }
        let (row, counters) = self.load(user_id.0, now).await?;
        Ok(cost <= available_credits(effective_tier(&row, now), &counters))
    }

    /// Deduct `cost` credits.
    ///
    /// A zero or over-budget cost is refused without touching the counters.
    /// If the store fails while committing, the spend still counts for this
    /// request and the error is only logged.
    #[instrument(skip(self))]
    pub async fn use_credits(
        &self,
        user_id: &UserId,
        cost: u32,
        label: &str,
        now: DateTime<Utc>,
    ) -> BillingResult<CreditSpend> {
        if self.config.early_access {
            debug!(label, cost, "Early access, skipping deduction");
            let (row, counters) = self.load(user_id.0, now).await?;
            return Ok(CreditSpend {
                success: true,
                cost,
                status: self.status(effective_tier(&row, now), &counters),
            });
        }

        for attempt in 1..=MAX_SPEND_ATTEMPTS {
            let row = self
                .subscriptions
                .get_or_create(user_id.0, now.date_naive())
                .await?;
            let tier = effective_tier(&row, now);
            let current = resolve_credit_state(&row, now);

            let Some(next) = spend(tier, &current, cost) else {
                debug!(label, cost, "Insufficient credits");
                return Ok(CreditSpend {
                    success: false,
                    cost,
                    status: self.status(tier, &current),
                });
            };

            match self
                .subscriptions
                .compare_and_swap_credits(user_id.0, &row.counters(), &next)
                .await
            {
                Ok(true) => {
                    debug!(label, cost, tier = %tier, "Credits spent");
                    metrics::counter!("billing_credits_spent_total", "tier" => tier.as_str())
                        .increment(u64::from(cost));
                    return Ok(CreditSpend {
                        success: true,
                        cost,
                        status: self.status(tier, &next),
                    });
                }
                Ok(false) => {
                    debug!(label, attempt, "Concurrent credit update, retrying");
                }
                Err(e) => {
                    warn!(label, cost, error = %e, "Failed to persist credit spend");
                    return Ok(CreditSpend {
                        success: true,
                        cost,
                        status: self.status(tier, &next),
                    });
                }
            }
        }

        warn!(label, cost, "Credit spend refused after repeated conflicts");
        let (row, counters) = self.load(user_id.0, now).await?;
        Ok(CreditSpend {
            success: false,
            cost,
            status: self.status(effective_tier(&row, now), &counters),
        })
    }

    /// Add purchased credits to the bonus balance, returning the new balance
    #[instrument(skip(self))]
    pub async fn add_bonus(
        &self,
        user_id: &UserId,
        credits: u32,
        now: DateTime<Utc>,
    ) -> BillingResult<u32> {
        for _ in 0..MAX_SPEND_ATTEMPTS {
            let row = self
                .subscriptions
                .get_or_create(user_id.0, now.date_naive())
                .await?;
            let mut next = resolve_credit_state(&row, now);
            next.bonus = to_column(non_negative(next.bonus).saturating_add(credits));

            if self
                .subscriptions
                .compare_and_swap_credits(user_id.0, &row.counters(), &next)
                .await?
            {
                return Ok(non_negative(next.bonus));
            }
        }

        Err(BillingError::Conflict(
            "bonus credits could not be applied".to_string(),
        ))
    }
}
