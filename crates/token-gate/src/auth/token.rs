//! Unverified peeks into raw bearer tokens.
//!
//! Two pieces of a token are read before any signature check: the header's
//! `kid` (to select the verification key) and the payload's `iss` (to narrow
//! the issuer candidates). Neither value is trusted for anything else; the
//! token is always fully verified afterwards.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Peeked values are used only for key/issuer lookup, never authorization

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Maximum allowed token size in bytes (8KB).
///
/// Typical signed tokens are a few hundred bytes; anything larger is rejected
/// before base64 decoding or cryptographic work happens.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Errors from unverified token inspection.
///
/// Messages are generic; the precise failure is logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RawTokenError {
    /// Token size exceeds [`MAX_TOKEN_SIZE_BYTES`].
    #[error("token exceeds maximum allowed size")]
    TokenTooLarge,

    /// Token is not three dot-separated base64url segments of valid JSON.
    #[error("token is not a well-formed JWT")]
    Malformed,

    /// Token header carries no usable `kid`.
    #[error("token header has no key id")]
    MissingKid,
}

/// Decode one dot-separated segment of a token as JSON.
fn decode_segment(token: &str, index: usize) -> Result<serde_json::Value, RawTokenError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "gate.token",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(RawTokenError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "gate.token",
            parts = parts.len(),
            "Token rejected: wrong segment count"
        );
        return Err(RawTokenError::Malformed);
    }

    let segment = parts.get(index).ok_or(RawTokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "gate.token", error = %e, "Failed to decode token segment base64");
        RawTokenError::Malformed
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "gate.token", error = %e, "Failed to parse token segment JSON");
        RawTokenError::Malformed
    })
}

/// Extract the `kid` (key ID) from a token header without verifying the
/// signature.
///
/// Empty `kid` values are rejected along with missing ones.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds the size limit
/// - `Malformed` - token is not valid JWT structure
/// - `MissingKid` - header has no non-empty string `kid`
pub fn extract_kid(token: &str) -> Result<String, RawTokenError> {
    let header = decode_segment(token, 0)?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(RawTokenError::MissingKid)
}

/// Extract the `iss` claim from a token payload without verifying the
/// signature.
///
/// Used only to narrow the issuer candidate set; the claim is re-validated
/// against the selected issuer during full verification.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds the size limit
/// - `Malformed` - token is not valid JWT structure, or `iss` is absent or
///   not a non-empty string
pub fn extract_unverified_issuer(token: &str) -> Result<String, RawTokenError> {
    let payload = decode_segment(token, 1)?;

    payload
        .get("iss")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(RawTokenError::Malformed)
}
