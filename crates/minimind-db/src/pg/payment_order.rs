//! PostgreSQL payment order repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::PaymentOrderRow;
use crate::repo::PaymentOrderRepository;

/// PostgreSQL payment order repository
#[derive(Clone)]
pub struct PgPaymentOrderRepository {
    pool: PgPool,
}

impl PgPaymentOrderRepository {
    /// Create a new payment order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentOrderRepository for PgPaymentOrderRepository {
    async fn create(&self, order: &PaymentOrderRow) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_orders
                (order_id, user_id, kind, tier, plan_type, product_id, amount, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.user_id)
        .bind(&order.kind)
        .bind(&order.tier)
        .bind(&order.plan_type)
        .bind(&order.product_id)
        .bind(order.amount)
        .bind(&order.currency)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Duplicate,
            other => DbError::Sqlx(other),
        })?;

        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> DbResult<Option<PaymentOrderRow>> {
        let order = sqlx::query_as::<_, PaymentOrderRow>(
            r#"
            SELECT order_id, user_id, kind, tier, plan_type, product_id, amount, currency,
                   payment_id, redeemed_at, created_at
            FROM payment_orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn redeem(
        &self,
        order_id: &str,
        payment_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_orders
            SET payment_id = $2, redeemed_at = $3
            WHERE order_id = $1 AND redeemed_at IS NULL
            "#,
        )
        .bind(order_id)
        .bind(payment_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, order_id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE payment_orders
            SET payment_id = NULL, redeemed_at = NULL
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
