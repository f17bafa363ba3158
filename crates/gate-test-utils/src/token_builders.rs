//! Builder patterns for test token claims.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for test JWT claim sets.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_subject("alice")
///     .issued_by("https://issuer.example/")
///     .for_audience("api://app")
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iss: Option<String>,
    aud: Option<String>,
    exp: i64,
    iat: i64,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a builder with defaults: subject `test-subject`, no issuer or
    /// audience, expiry one hour out.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            iss: None,
            aud: None,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            extra: Map::new(),
        }
    }

    /// Set the subject.
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the `iss` claim. Unset by default (omitted from the payload).
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Set the `aud` claim. Unset by default (omitted from the payload).
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.aud = Some(audience.to_string());
        self
    }

    /// Set expiration relative to now. Negative values build an already
    /// expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set the issued-at timestamp.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add an arbitrary claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claim set as a JSON value.
    pub fn build(self) -> Value {
        let mut claims = json!({
            "sub": self.sub,
            "exp": self.exp,
            "iat": self.iat,
        });

        if let Value::Object(map) = &mut claims {
            if let Some(iss) = self.iss {
                map.insert("iss".to_string(), json!(iss));
            }
            if let Some(aud) = self.aud {
                map.insert("aud".to_string(), json!(aud));
            }
            map.extend(self.extra);
        }

        claims
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
