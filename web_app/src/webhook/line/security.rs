//! Signature verification for incoming LINE webhook requests
//!
//! LINE signs every webhook payload with HMAC-SHA256 keyed by the channel
//! secret and sends the digest, base64 encoded, in the `X-Line-Signature`
//! header.
//!
//! To verify authenticity:
//! 1. Compute HMAC-SHA256 of the raw request body using the channel secret
//! 2. Base64 encode the digest
//! 3. Compare it with the header value
//! 4. Only process the request if both match exactly
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison is constant-time
//! - An empty channel secret never verifies

use crate::consts;
use base64::{Engine, prelude::BASE64_STANDARD};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes the base64 encoded HMAC-SHA256 of `payload` keyed by `channel_secret`
pub fn compute_signature(payload: &[u8], channel_secret: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())?;
    mac.update(payload);

    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies the `X-Line-Signature` header against the request payload
///
/// # Arguments
///
/// * `signature_header` - The header value, `None` when the header is absent
/// * `payload` - The raw request body bytes
/// * `channel_secret` - The LINE channel secret
///
/// # Returns
///
/// * `true` if the header equals the computed signature
/// * `false` if the header is missing, differs, or the secret is empty
pub fn verify_signature(
    signature_header: Option<&str>,
    payload: &[u8],
    channel_secret: &str,
) -> bool {
    let computed_signature = match compute_signature(payload, channel_secret) {
        Ok(sig) => sig,
        Err(e) => {
            logfire::error!(
                "Failed to create HMAC instance: {error}",
                error = e.to_string()
            );
            return false;
        }
    };

    if channel_secret.is_empty() {
        logfire::error!(
            "Signature mismatch: channel secret is not configured. {hint}",
            hint = consts::SIGNATURE_MISMATCH_HINT
        );
        return false;
    }

    let Some(header_signature) = signature_header else {
        logfire::warn!(
            "Signature mismatch: missing {header} header, computed {computed_sig}. {hint}",
            header = consts::LINE_SIGNATURE_HEADER,
            computed_sig = computed_signature.clone(),
            hint = consts::SIGNATURE_MISMATCH_HINT
        );
        return false;
    };

    let is_valid: bool = header_signature
        .as_bytes()
        .ct_eq(computed_signature.as_bytes())
        .into();

    if !is_valid {
        logfire::warn!(
            "Signature mismatch: header {header_sig}, computed {computed_sig}. {hint}",
            header_sig = header_signature.to_string(),
            computed_sig = computed_signature,
            hint = consts::SIGNATURE_MISMATCH_HINT
        );
    }

    is_valid
}
