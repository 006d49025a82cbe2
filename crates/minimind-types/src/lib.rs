//! MiniMind Types - Shared domain types
//!
//! This crate contains domain types used across MiniMind billing:
//! - User identity
//! - Subscription tiers, plans and feature gating
//! - Credit costs and balances
//! - Payment products and pricing

pub mod billing;
pub mod credits;
pub mod error;
pub mod subscription;
pub mod tier;
pub mod user;

pub use billing::*;
pub use credits::*;
pub use error::*;
pub use subscription::*;
pub use tier::*;
pub use user::*;
