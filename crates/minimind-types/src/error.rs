//! Parse errors for domain enums

use thiserror::Error;

/// Error returned when a string does not name a known domain value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown tier
    #[error("invalid tier: {0}")]
    Tier(String),

    /// Unknown plan type
    #[error("invalid plan type: {0}")]
    PlanType(String),

    /// Unknown subscription status
    #[error("invalid subscription status: {0}")]
    Status(String),

    /// Unknown feature
    #[error("unknown feature: {0}")]
    Feature(String),

    /// Unknown top-up product
    #[error("unknown product: {0}")]
    Product(String),

    /// Not a usable user UUID
    #[error("invalid user id: {0}")]
    UserId(String),
}
