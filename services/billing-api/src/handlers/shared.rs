//! Shared handler utilities
//!
//! Common validation and metrics helpers used across handlers.

use std::time::Instant;

use minimind_types::Feature;

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for spend labels
const MAX_LABEL_LEN: usize = 64;

/// Maximum length for provider identifiers (order, payment, signature)
const MAX_STRING_LEN: usize = 256;

/// Largest raw credit amount a single request may spend
pub const MAX_RAW_COST: u32 = 100;

/// Validate a spend label before it reaches logs.
///
/// Allows alphanumeric, underscore, hyphen, dot and colon.
///
/// # Example
/// ```ignore
/// validate_label("mastery")?;          // Ok
/// validate_label("explain:beginner")?; // Ok
/// validate_label("foo<script>")?;      // Err
/// ```
pub fn validate_label(label: &str) -> Result<(), ApiError> {
    if label.is_empty() {
        return Err(ApiError::BadRequest("Label cannot be empty".into()));
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(ApiError::BadRequest(format!(
            "Label too long (max {MAX_LABEL_LEN} chars)"
        )));
    }

    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    {
        return Err(ApiError::BadRequest(
            "Label contains invalid characters (use alphanumeric, _, -, ., :)".into(),
        ));
    }

    Ok(())
}

/// Validate a user-provided string is present and within safe bounds.
pub fn validate_string_length(value: &str, field_name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field_name} is required")));
    }
    if value.len() > MAX_STRING_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_STRING_LEN} chars)"
        )));
    }
    Ok(())
}

/// Validate a raw credit amount
pub fn validate_cost(cost: u32) -> Result<(), ApiError> {
    if cost == 0 || cost > MAX_RAW_COST {
        return Err(ApiError::BadRequest(format!(
            "cost must be between 1 and {MAX_RAW_COST}"
        )));
    }
    Ok(())
}

/// Parse a feature name sent by the client
pub fn parse_feature(value: &str) -> Result<Feature, ApiError> {
    value
        .parse::<Feature>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "billing_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================
