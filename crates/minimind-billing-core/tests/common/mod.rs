//! Common test utilities for minimind-billing-core integration tests

pub mod harness;

#[allow(unused_imports)]
pub use harness::{signed_confirmation, webhook_body, Harness, MockProvider, KEY_SECRET, WEBHOOK_SECRET};
