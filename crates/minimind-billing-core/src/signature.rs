//! HMAC-SHA256 signatures
//!
//! Razorpay signs checkout confirmations with the key secret over
//! `order_id|payment_id`, and webhooks with the webhook secret over the raw
//! request body. Both are lowercase hex HMAC-SHA256 digests and both go
//! through [`verify`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Sign a payload, returning the lowercase hex digest
pub fn sign(payload: &[u8], secret: &str) -> Result<String, BillingError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against a payload in constant time
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = sign(payload, secret) else {
        return false;
    };
    let provided = signature.trim().to_ascii_lowercase();
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Payload Razorpay signs for a checkout confirmation
pub fn checkout_payload(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}
