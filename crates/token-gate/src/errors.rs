//! Request-level rejection type.
//!
//! Every rejection maps to 401 with a machine-readable `{"detail": ...}`
//! body drawn from a small fixed vocabulary. The body never carries issuer
//! names, key material, or internal failure detail; precise reasons are
//! logged server-side only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why the gate rejected a request.
///
/// All variants are per-request and recoverable; configuration problems are
/// a separate type raised at construction ([`crate::config::ConfigError`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No bearer credential in the configured header (or fallback cookie).
    #[error("no bearer credential presented")]
    MissingCredential,

    /// The presented token failed structural checks before verification.
    #[error("bearer token is malformed")]
    MalformedToken,

    /// Every candidate issuer failed to verify the token.
    #[error("no configured issuer verified the token")]
    AllIssuersFailed,

    /// The token's issuer claim matched no configured issuer, and the
    /// fallback pass over all issuers failed too.
    #[error("token issuer is not configured")]
    IssuerNotRecognized,
}

impl GateError {
    /// The client-visible reason string.
    ///
    /// Deliberately coarse: three strings cover every rejection.
    pub fn detail(&self) -> &'static str {
        match self {
            GateError::MissingCredential => "Missing or invalid token",
            GateError::MalformedToken | GateError::AllIssuersFailed => "Token validation failed",
            GateError::IssuerNotRecognized => "Issuer not recognized",
        }
    }
}

#[derive(Serialize)]
struct RejectionBody {
    detail: &'static str,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        tracing::debug!(target: "gate.middleware", reason = %self, "Request rejected");

        let body = RejectionBody {
            detail: self.detail(),
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();

        if let Ok(header_value) = "Bearer error=\"invalid_token\"".parse() {
            response
                .headers_mut()
                .insert("WWW-Authenticate", header_value);
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_detail_vocabulary() {
        assert_eq!(
            GateError::MissingCredential.detail(),
            "Missing or invalid token"
        );
        assert_eq!(GateError::MalformedToken.detail(), "Token validation failed");
        assert_eq!(
            GateError::AllIssuersFailed.detail(),
            "Token validation failed"
        );
        assert_eq!(
            GateError::IssuerNotRecognized.detail(),
            "Issuer not recognized"
        );
    }

    #[tokio::test]
    async fn test_into_response_missing_credential() {
        let response = GateError::MissingCredential.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response.headers().get("WWW-Authenticate");
        assert!(www_auth.is_some(), "Should include WWW-Authenticate header");
        assert!(www_auth.unwrap().to_str().unwrap().starts_with("Bearer"));

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"detail": "Missing or invalid token"}));
    }

    #[tokio::test]
    async fn test_into_response_all_issuers_failed() {
        let response = GateError::AllIssuersFailed.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"detail": "Token validation failed"}));
    }

    #[tokio::test]
    async fn test_into_response_issuer_not_recognized() {
        let response = GateError::IssuerNotRecognized.into_response();

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"detail": "Issuer not recognized"}));
    }

    #[tokio::test]
    async fn test_body_has_no_extra_fields() {
        let response = GateError::MalformedToken.into_response();
        let body = read_body_json(response.into_body()).await;

        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 1, "only the detail field is exposed");
    }
}
