//! Common test utilities for billing-api router tests

pub mod app;

#[allow(unused_imports)]
pub use app::{
    bearer, send, signed_webhook, TestApp, StaticProvider, JWT_SECRET, KEY_ID, KEY_SECRET,
    WEBHOOK_SECRET,
};
