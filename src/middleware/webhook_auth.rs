// Webhook signature verification
// Deliveries from the auth and payment collaborators carry an HMAC-SHA256
// signature over the raw body, base64-encoded in the X-Miky-Signature
// header. Verification is constant-time via ring.

use axum::http::HeaderMap;
use base64::prelude::*;
use ring::hmac;
use tracing::warn;

use crate::{app_config::AppConfig, utils::ServiceError};

pub const SIGNATURE_HEADER: &str = "x-miky-signature";

/// Compute the signature for a payload; used by tests and by operator
/// tooling that replays deliveries
pub fn sign(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, body);
    BASE64_STANDARD.encode(tag.as_ref())
}

/// Verify the delivery signature before any side effect.
/// An unset secret skips verification outside production only.
pub fn require_valid_signature(
    config: &AppConfig,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), ServiceError> {
    let secret = &config.webhook.secret;

    if secret.is_empty() {
        if config.is_production() {
            return Err(ServiceError::Unauthorized(
                "Webhook secret is not configured".to_string(),
            ));
        }
        warn!("Webhook secret not configured, accepting unsigned delivery");
        return Ok(());
    }

    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("Missing webhook signature".to_string()))?;

    let provided_bytes = BASE64_STANDARD
        .decode(provided)
        .map_err(|_| ServiceError::Unauthorized("Malformed webhook signature".to_string()))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, body, &provided_bytes)
        .map_err(|_| ServiceError::Unauthorized("Invalid webhook signature".to_string()))
}
