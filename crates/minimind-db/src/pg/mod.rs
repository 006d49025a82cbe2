//! PostgreSQL repository implementations

mod payment_order;
mod subscription;
mod webhook_event;

pub use payment_order::PgPaymentOrderRepository;
pub use subscription::PgSubscriptionRepository;
pub use webhook_event::PgWebhookEventRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub webhook_events: PgWebhookEventRepository,
    pub payment_orders: PgPaymentOrderRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            webhook_events: PgWebhookEventRepository::new(pool.clone()),
            payment_orders: PgPaymentOrderRepository::new(pool),
        }
    }
}
