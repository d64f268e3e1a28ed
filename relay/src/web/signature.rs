//! Webhook authentication.
//!
//! GitLab sends the configured secret verbatim in `X-Gitlab-Token`; older
//! relays sent it in `X-Hub-Signature`, which is still accepted. When the
//! relay runs in HMAC mode the header carries `sha256=<hex>` computed over the
//! raw body instead.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::config::SignatureMode;

type HmacSha256 = Hmac<Sha256>;

/// Headers checked for the shared secret, in order.
pub const TOKEN_HEADERS: &[&str] = &["X-Gitlab-Token", "X-Hub-Signature"];

/// Check an inbound request against the configured secret.
///
/// Returns `true` unconditionally when no secret is configured.
pub fn authenticate(
    headers: &HeaderMap,
    secret: &Option<String>,
    mode: SignatureMode,
    body: &[u8],
) -> bool {
    let Some(secret) = secret.as_deref().filter(|_| is_auth_enabled(secret)) else {
        return true;
    };

    let Some(provided) = token_header(headers) else {
        return false;
    };

    match mode {
        SignatureMode::Token => constant_time_compare(secret, provided),
        SignatureMode::HmacSha256 => verify_hmac_sha256(secret, body, provided),
    }
}

/// First token header present on the request.
pub fn token_header(headers: &HeaderMap) -> Option<&str> {
    TOKEN_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
}

/// Verify a `sha256=<hex>` signature over `body`.
pub fn verify_hmac_sha256(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(expected_hex) = signature_header.strip_prefix("sha256=") else {
        warn!("webhook_signature_missing_prefix");
        return false;
    };

    let expected = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(signature_length = expected_hex.len(), "webhook_signature_invalid_hex");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };

    mac.update(body);

    // verify_slice compares in constant time
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if authentication is enabled.
pub fn is_auth_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}
