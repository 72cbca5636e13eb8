//! HMAC-SHA256 signing of sync payloads.
//!
//! The signature covers `{sync_id}.{timestamp}.{payload}` and is sent as `v1,{base64}` in the
//! `sync-signature` header, next to `sync-id` and `sync-timestamp`. Outbound pushes and inbound
//! updates use the same scheme.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const ID_HEADER: &str = "sync-id";
pub const TIMESTAMP_HEADER: &str = "sync-timestamp";
pub const SIGNATURE_HEADER: &str = "sync-signature";

/// Prefix marking a base64-encoded secret
pub const SECRET_PREFIX: &str = "whsec_";

/// Largest accepted clock difference for inbound signatures, in seconds
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Key bytes for a secret. `whsec_`-prefixed secrets are base64-decoded; anything else is used
/// as-is. Returns `None` for a prefixed secret with invalid base64.
pub fn secret_bytes(secret: &str) -> Option<Vec<u8>> {
    match secret.strip_prefix(SECRET_PREFIX) {
        Some(encoded) => BASE64_STANDARD.decode(encoded).ok(),
        None => Some(secret.as_bytes().to_vec()),
    }
}

/// Signs a payload, returning `v1,{base64-hmac-sha256}`
pub fn sign_payload(sync_id: &str, timestamp: i64, payload: &str, secret: &str) -> Option<String> {
    let key = secret_bytes(secret)?;

    let mut mac = HmacSha256::new_from_slice(&key).ok()?;
    mac.update(format!("{sync_id}.{timestamp}.{payload}").as_bytes());
    let signature = mac.finalize().into_bytes();

    Some(format!("v1,{}", BASE64_STANDARD.encode(signature)))
}

/// Checks a `v1,` signature in constant time
pub fn verify_signature(sync_id: &str, timestamp: i64, payload: &str, signature: &str, secret: &str) -> bool {
    let Some(sig_value) = signature.strip_prefix("v1,") else {
        return false;
    };
    let Some(expected) = sign_payload(sync_id, timestamp, payload, secret) else {
        return false;
    };
    let Some(expected_value) = expected.strip_prefix("v1,") else {
        return false;
    };

    constant_time_eq(sig_value.as_bytes(), expected_value.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
