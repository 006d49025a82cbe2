//! In-memory repository implementations
//!
//! Backed by `DashMap`; used by tests and by local runs without PostgreSQL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BillingFields, CreditCounters, PaymentOrderRow, SubscriptionRow};
use crate::repo::{PaymentOrderRepository, SubscriptionRepository, WebhookEventRepository};

/// In-memory subscription repository
#[derive(Default, Clone)]
pub struct MemorySubscriptionRepository {
    rows: Arc<DashMap<Uuid, SubscriptionRow>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row directly
    pub fn insert(&self, row: SubscriptionRow) {
        self.rows.insert(row.user_id, row);
    }

    /// Current stored row for a user
    pub fn get(&self, user_id: Uuid) -> Option<SubscriptionRow> {
        self.rows.get(&user_id).map(|r| r.value().clone())
    }

    /// Make every write fail with `DbError::Unavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn find_where(&self, pred: impl Fn(&SubscriptionRow) -> bool) -> Option<SubscriptionRow> {
        self.rows
            .iter()
            .find(|r| pred(r.value()))
            .map(|r| r.value().clone())
    }
}

#[async_trait]
impl SubscriptionRepository for MemorySubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.get(user_id))
    }

    async fn find_by_razorpay_subscription_id(
        &self,
        subscription_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.find_where(|r| r.razorpay_subscription_id.as_deref() == Some(subscription_id)))
    }

    async fn find_by_razorpay_order_id(&self, order_id: &str) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.find_where(|r| r.razorpay_order_id.as_deref() == Some(order_id)))
    }

    async fn get_or_create(&self, user_id: Uuid, today: NaiveDate) -> DbResult<SubscriptionRow> {
        if let Some(row) = self.get(user_id) {
            return Ok(row);
        }
        self.check_writable()?;

        let row = self
            .rows
            .entry(user_id)
            .or_insert_with(|| {
                let mut row = SubscriptionRow::new_free(user_id, Utc::now());
                row.credits_last_daily_reset = today;
                row.credits_last_monthly_reset = today;
                row
            })
            .value()
            .clone();
        Ok(row)
    }

    async fn compare_and_swap_credits(
        &self,
        user_id: Uuid,
        expected: &CreditCounters,
        new: &CreditCounters,
    ) -> DbResult<bool> {
        self.check_writable()?;

        let Some(mut row) = self.rows.get_mut(&user_id) else {
            return Err(DbError::NotFound);
        };
        if row.counters() != *expected {
            return Ok(false);
        }
        row.set_counters(new);
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_billing(&self, user_id: Uuid, billing: &BillingFields) -> DbResult<()> {
        self.check_writable()?;

        let Some(mut row) = self.rows.get_mut(&user_id) else {
            return Err(DbError::NotFound);
        };
        row.set_billing(billing);
        row.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory webhook event log
#[derive(Default, Clone)]
pub struct MemoryWebhookEventRepository {
    events: Arc<DashMap<String, String>>,
}

impl MemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl WebhookEventRepository for MemoryWebhookEventRepository {
    async fn record(&self, event_id: &str, event_type: &str) -> DbResult<bool> {
        let mut inserted = false;
        self.events.entry(event_id.to_string()).or_insert_with(|| {
            inserted = true;
            event_type.to_string()
        });
        Ok(inserted)
    }

    async fn remove(&self, event_id: &str) -> DbResult<()> {
        self.events.remove(event_id);
        Ok(())
    }
}

/// In-memory payment order book
#[derive(Default, Clone)]
pub struct MemoryPaymentOrderRepository {
    orders: Arc<DashMap<String, PaymentOrderRow>>,
}

impl MemoryPaymentOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_id: &str) -> Option<PaymentOrderRow> {
        self.orders.get(order_id).map(|o| o.value().clone())
    }
}

#[async_trait]
impl PaymentOrderRepository for MemoryPaymentOrderRepository {
    async fn create(&self, order: &PaymentOrderRow) -> DbResult<()> {
        match self.orders.entry(order.order_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DbError::Duplicate),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(())
            }
        }
    }

    async fn find_by_order_id(&self, order_id: &str) -> DbResult<Option<PaymentOrderRow>> {
        Ok(self.get(order_id))
    }

    async fn redeem(
        &self,
        order_id: &str,
        payment_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let Some(mut order) = self.orders.get_mut(order_id) else {
            return Ok(false);
        };
        if order.is_redeemed() {
            return Ok(false);
        }
        order.payment_id = Some(payment_id.to_string());
        order.redeemed_at = Some(at);
        Ok(true)
    }

    async fn release(&self, order_id: &str) -> DbResult<()> {
        if let Some(mut order) = self.orders.get_mut(order_id) {
            order.payment_id = None;
            order.redeemed_at = None;
        }
        Ok(())
    }
}
