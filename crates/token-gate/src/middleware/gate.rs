//! The gate middleware: per-request authentication state machine.
//!
//! Each request runs `START → PATH_CHECKED → CREDENTIAL_EXTRACTED →
//! ISSUER_SELECTED → VERIFIED | REJECTED`. The path check is pure and runs
//! first; only gated paths pay for credential extraction and verification.

use crate::auth::jwks::KeySetCache;
use crate::auth::registry::IssuerRegistry;
use crate::auth::token::{extract_unverified_issuer, MAX_TOKEN_SIZE_BYTES};
use crate::auth::verifier::{TokenVerifier, VerificationError};
use crate::errors::GateError;
use crate::policy::AccessPolicy;
use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Shared state for the gate middleware.
///
/// Built by [`crate::config::GateConfig::build`]; wrap in an `Arc` and apply
/// with `axum::middleware::from_fn_with_state`:
///
/// ```rust,ignore
/// let state = Arc::new(GateConfig::new().issuer(issuer).protect_paths(["/secure"]).build()?);
/// let app = Router::new()
///     .route("/secure", get(secure_handler))
///     .layer(middleware::from_fn_with_state(state, token_gate::authenticate));
/// ```
pub struct GateState {
    registry: IssuerRegistry,
    verifier: TokenVerifier,
    policy: AccessPolicy,
    header_name: String,
    cookie_name: Option<String>,
}

impl GateState {
    pub(crate) fn new(
        registry: IssuerRegistry,
        verifier: TokenVerifier,
        policy: AccessPolicy,
        header_name: String,
        cookie_name: Option<String>,
    ) -> Self {
        Self {
            registry,
            verifier,
            policy,
            header_name,
            cookie_name,
        }
    }

    /// The configured issuer registry.
    pub fn registry(&self) -> &IssuerRegistry {
        &self.registry
    }

    /// The active path policy.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// The credential header name.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// The fallback cookie name, if cookie extraction is enabled.
    pub fn cookie_name(&self) -> Option<&str> {
        self.cookie_name.as_deref()
    }

    /// The shared key-set cache, for operational invalidation.
    pub fn key_sets(&self) -> &KeySetCache {
        self.verifier.key_sets()
    }
}

/// How the issuer candidate set was chosen for a request.
enum IssuerSelection {
    /// Unverified `iss` matched one configured issuer.
    Matched,

    /// Unverified `iss` was readable but matched no configured issuer.
    Unmatched,

    /// Unverified `iss` could not be read; all issuers are candidates.
    Unreadable,
}

/// Authentication middleware.
///
/// Open paths pass through untouched. Gated paths must present a bearer
/// credential that verifies against a configured issuer; on success the
/// [`VerifiedIdentity`](crate::VerifiedIdentity) is inserted into the request
/// extensions, on failure the request short-circuits with a 401 before any
/// downstream handler runs.
#[instrument(skip_all, name = "gate.middleware", fields(path = %req.uri().path()))]
pub async fn authenticate(
    State(state): State<Arc<GateState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let path = req.uri().path();

    if state.policy.is_open(path) {
        tracing::debug!(target: "gate.middleware", "Path is open, bypassing verification");
        return Ok(next.run(req).await);
    }

    let token = bearer_from_header(req.headers(), &state.header_name)
        .or_else(|| {
            state
                .cookie_name
                .as_deref()
                .and_then(|name| token_from_cookie(req.headers(), name))
        })
        .ok_or_else(|| {
            tracing::debug!(target: "gate.middleware", "No bearer credential presented");
            GateError::MissingCredential
        })?;

    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "gate.middleware",
            token_size = token.len(),
            "Oversized token rejected"
        );
        return Err(GateError::MalformedToken);
    }

    // Narrow the candidate set by the token's unverified issuer claim. An
    // unreadable or unknown claim falls back to every configured issuer in
    // registration order rather than failing outright.
    let (candidates, selection) = match extract_unverified_issuer(&token) {
        Ok(iss) => match state.registry.find(&iss) {
            Some(config) => (std::slice::from_ref(config), IssuerSelection::Matched),
            None => {
                tracing::debug!(target: "gate.middleware", "Unverified issuer matched no configured issuer, trying all");
                (state.registry.all(), IssuerSelection::Unmatched)
            }
        },
        Err(e) => {
            tracing::debug!(target: "gate.middleware", error = ?e, "Unverified issuer claim unreadable, trying all");
            (state.registry.all(), IssuerSelection::Unreadable)
        }
    };

    for candidate in candidates {
        match state.verifier.verify(&token, candidate).await {
            Ok(identity) => {
                tracing::debug!(
                    target: "gate.middleware",
                    issuer = %candidate.name,
                    "Request authenticated"
                );
                req.extensions_mut().insert(identity);
                return Ok(next.run(req).await);
            }
            // Key-set fetch failures are an operational signal (unreachable
            // trust anchor), everything else is an ordinary rejection.
            Err(VerificationError::KeySetFetch(e)) => {
                tracing::warn!(
                    target: "gate.middleware",
                    issuer = %candidate.name,
                    error = %e,
                    "Candidate issuer key set unavailable"
                );
            }
            Err(e) => {
                tracing::debug!(
                    target: "gate.middleware",
                    issuer = %candidate.name,
                    error = %e,
                    "Candidate issuer rejected token"
                );
            }
        }
    }

    match selection {
        IssuerSelection::Unmatched => Err(GateError::IssuerNotRecognized),
        IssuerSelection::Matched | IssuerSelection::Unreadable => Err(GateError::AllIssuersFailed),
    }
}

/// Extract a bearer token from the configured header.
///
/// The scheme comparison is case-insensitive (`Bearer`, `bearer`, `BEARER`
/// are all accepted); the remainder is trimmed.
fn bearer_from_header(headers: &HeaderMap, header_name: &str) -> Option<String> {
    let value = headers.get(header_name)?.to_str().ok()?;
    let scheme = value.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = value.get(7..)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Extract a token from a named cookie.
fn token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=') {
                if name.trim() == cookie_name {
                    let token = token.trim();
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }
    None
}
