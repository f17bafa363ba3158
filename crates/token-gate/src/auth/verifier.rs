//! Token verification against one configured issuer.
//!
//! Validates signature, audience, issuer, and expiry, in that order of
//! hard gates. The signing algorithm is pinned to RS256; the token header's
//! `alg` field is never consulted when selecting the algorithm, since
//! honoring an attacker-supplied algorithm is a known signature-bypass
//! vector.

use crate::auth::claims::VerifiedIdentity;
use crate::auth::jwks::{Jwk, KeySetCache, KeySetFetchError};
use crate::auth::token::{extract_kid, RawTokenError};
use crate::config::IssuerConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Which standard-claim check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimCheck {
    Audience,
    Issuer,
    Expiry,
}

impl fmt::Display for ClaimCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimCheck::Audience => write!(f, "audience"),
            ClaimCheck::Issuer => write!(f, "issuer"),
            ClaimCheck::Expiry => write!(f, "expiry"),
        }
    }
}

/// Tagged per-candidate verification failure.
///
/// Every variant is surfaced to server-side diagnostics; clients only ever
/// see the gate's coarse rejection vocabulary.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Token is not well-formed (segment count, encoding, oversized).
    #[error("token is malformed")]
    Malformed,

    /// Token header carries no usable key id.
    #[error("token header has no key id")]
    MissingKid,

    /// The issuer's key set could not be fetched.
    #[error("key set unavailable: {0}")]
    KeySetFetch(#[from] KeySetFetchError),

    /// No published key matches the token's key id. Covers rotation where
    /// the old key id is no longer served.
    #[error("no key matching kid {0:?} in key set")]
    KeyNotFound(String),

    /// Cryptographic signature mismatch.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Audience, issuer, or expiry constraint violated.
    #[error("claim validation failed: {0}")]
    ClaimInvalid(ClaimCheck),
}

/// Verifier bound to a shared key-set cache.
pub struct TokenVerifier {
    key_sets: Arc<KeySetCache>,

    /// Clock skew tolerance in seconds applied to expiry validation.
    clock_skew_seconds: u64,
}

impl TokenVerifier {
    pub fn new(key_sets: Arc<KeySetCache>, clock_skew_seconds: u64) -> Self {
        Self {
            key_sets,
            clock_skew_seconds,
        }
    }

    /// The shared key-set cache, exposed for operational invalidation.
    pub fn key_sets(&self) -> &KeySetCache {
        &self.key_sets
    }

    /// Verify a token against one issuer descriptor.
    ///
    /// Ordered hard gates, each short-circuiting:
    ///
    /// 1. Header peek for the signing key id
    /// 2. Key set resolution via the cache
    /// 3. Key id lookup inside the set
    /// 4. RS256 signature over header+payload
    /// 5. Audience (exact), issuer (exact), expiry (future)
    ///
    /// # Errors
    ///
    /// Returns the first gate's `VerificationError`; the caller decides how
    /// (and whether) to try further issuer candidates.
    #[instrument(skip_all, fields(issuer = %issuer.name))]
    pub async fn verify(
        &self,
        token: &str,
        issuer: &IssuerConfig,
    ) -> Result<VerifiedIdentity, VerificationError> {
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "gate.verify", error = ?e, "Token key id extraction failed");
            match e {
                RawTokenError::MissingKid => VerificationError::MissingKid,
                _ => VerificationError::Malformed,
            }
        })?;

        let key_set = self.key_sets.get(&issuer.jwks_uri).await?;

        let jwk = key_set
            .key(&kid)
            .ok_or_else(|| VerificationError::KeyNotFound(kid.clone()))?;

        let decoding_key = decoding_key_for(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.clock_skew_seconds;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.set_audience(&[issuer.audience.as_str()]);
        validation.set_issuer(&[issuer.issuer.as_str()]);

        let token_data =
            decode::<Map<String, Value>>(token, &decoding_key, &validation).map_err(|e| {
                let mapped = map_decode_error(&e);
                tracing::debug!(target: "gate.verify", error = %e, mapped = ?mapped, "Token verification failed");
                mapped
            })?;

        tracing::debug!(target: "gate.verify", "Token verified");
        Ok(VerifiedIdentity::new(token_data.claims))
    }
}

/// Build an RS256 decoding key from a published JWK.
///
/// A key whose type, algorithm, or material cannot back RS256 verification
/// is operationally equivalent to an absent key id: the published document
/// is the source of truth, and this key cannot verify anything.
fn decoding_key_for(jwk: &Jwk) -> Result<DecodingKey, VerificationError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "gate.verify", kid = %jwk.kid, kty = %jwk.kty, "Unexpected JWK key type");
        return Err(VerificationError::KeyNotFound(jwk.kid.clone()));
    }
    if let Some(alg) = &jwk.alg {
        if alg != "RS256" {
            tracing::warn!(target: "gate.verify", kid = %jwk.kid, alg = %alg, "Unexpected JWK algorithm");
            return Err(VerificationError::KeyNotFound(jwk.kid.clone()));
        }
    }

    let (n, e) = match (&jwk.n, &jwk.e) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            tracing::warn!(target: "gate.verify", kid = %jwk.kid, "JWK missing RSA modulus or exponent");
            return Err(VerificationError::KeyNotFound(jwk.kid.clone()));
        }
    };

    DecodingKey::from_rsa_components(n, e).map_err(|err| {
        tracing::warn!(target: "gate.verify", kid = %jwk.kid, error = %err, "JWK carries unusable RSA components");
        VerificationError::KeyNotFound(jwk.kid.clone())
    })
}

fn map_decode_error(error: &jsonwebtoken::errors::Error) -> VerificationError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            VerificationError::SignatureInvalid
        }
        ErrorKind::ExpiredSignature => VerificationError::ClaimInvalid(ClaimCheck::Expiry),
        ErrorKind::InvalidAudience => VerificationError::ClaimInvalid(ClaimCheck::Audience),
        ErrorKind::InvalidIssuer => VerificationError::ClaimInvalid(ClaimCheck::Issuer),
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => VerificationError::ClaimInvalid(ClaimCheck::Audience),
            "iss" => VerificationError::ClaimInvalid(ClaimCheck::Issuer),
            "exp" => VerificationError::ClaimInvalid(ClaimCheck::Expiry),
            _ => VerificationError::Malformed,
        },
        _ => VerificationError::Malformed,
    }
}
