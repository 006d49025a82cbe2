//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BillingFields, CreditCounters, SubscriptionRow};
use crate::repo::SubscriptionRepository;

const COLUMNS: &str = "user_id, tier, status, plan_type, current_period_start, \
    current_period_end, grace_period_end, credits_daily_used, credits_monthly_used, \
    credits_bonus, credits_last_daily_reset, credits_last_monthly_reset, \
    razorpay_order_id, razorpay_customer_id, razorpay_subscription_id, created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one_by(&self, column: &str, value: &str) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!("SELECT {COLUMNS} FROM subscriptions WHERE {column} = $1 LIMIT 1");
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!("SELECT {COLUMNS} FROM subscriptions WHERE user_id = $1");
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }

    async fn find_by_razorpay_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        self.find_one_by("razorpay_subscription_id", subscription_id)
            .await
    }

    async fn find_by_razorpay_order_id(&self, order_id: &str) -> DbResult<Option<SubscriptionRow>> {
        self.find_one_by("razorpay_order_id", order_id).await
    }

    async fn get_or_create(&self, user_id: Uuid, today: NaiveDate) -> DbResult<SubscriptionRow> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, credits_last_daily_reset, credits_last_monthly_reset)
            VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        self.find_by_user_id(user_id).await?.ok_or(DbError::NotFound)
    }

    async fn compare_and_swap_credits(
        &self,
        user_id: Uuid,
        expected: &CreditCounters,
        new: &CreditCounters,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET credits_daily_used = $2,
                credits_monthly_used = $3,
                credits_bonus = $4,
                credits_last_daily_reset = $5,
                credits_last_monthly_reset = $6,
                updated_at = NOW()
            WHERE user_id = $1
              AND credits_daily_used = $7
              AND credits_monthly_used = $8
              AND credits_bonus = $9
              AND credits_last_daily_reset = $10
              AND credits_last_monthly_reset = $11
            "#,
        )
        .bind(user_id)
        .bind(new.daily_used)
        .bind(new.monthly_used)
        .bind(new.bonus)
        .bind(new.last_daily_reset)
        .bind(new.last_monthly_reset)
        .bind(expected.daily_used)
        .bind(expected.monthly_used)
        .bind(expected.bonus)
        .bind(expected.last_daily_reset)
        .bind(expected.last_monthly_reset)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_billing(&self, user_id: Uuid, billing: &BillingFields) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET tier = $2,
                status = $3,
                plan_type = $4,
                current_period_start = $5,
                current_period_end = $6,
                grace_period_end = $7,
                razorpay_order_id = $8,
                razorpay_customer_id = $9,
                razorpay_subscription_id = $10,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&billing.tier)
        .bind(&billing.status)
        .bind(&billing.plan_type)
        .bind(billing.current_period_start)
        .bind(billing.current_period_end)
        .bind(billing.grace_period_end)
        .bind(&billing.razorpay_order_id)
        .bind(&billing.razorpay_customer_id)
        .bind(&billing.razorpay_subscription_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
