//! Gate configuration.
//!
//! All configuration is validated at construction time; combinations the
//! request path cannot handle (conflicting policies, ambiguous issuers) are
//! rejected here and never reach request handling.

use crate::auth::jwks::{KeySetCache, RefreshPolicy};
use crate::auth::registry::IssuerRegistry;
use crate::auth::verifier::TokenVerifier;
use crate::middleware::gate::GateState;
use crate::policy::{AccessPolicy, PathRule};
use std::sync::Arc;
use thiserror::Error;

/// Default credential header name.
pub const DEFAULT_HEADER_NAME: &str = "authorization";

/// One configured trust anchor.
///
/// Tokens accepted on behalf of this issuer must carry exactly this
/// `audience` and `issuer`, signed by a key published at `jwks_uri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Operator-facing label, unique within a registry.
    pub name: String,

    /// Base trust-domain URL. Informational only.
    pub authority: String,

    /// Expected `aud` claim value, exact match.
    pub audience: String,

    /// Expected `iss` claim value, exact match. Also the registry lookup key.
    pub issuer: String,

    /// URL of the issuer's JSON Web Key Set document.
    pub jwks_uri: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("allow and protect path sets cannot both be configured")]
    ConflictingPolicies,

    #[error("duplicate issuer value in registry: {0}")]
    DuplicateIssuer(String),

    #[error("at least one issuer must be configured")]
    NoIssuers,

    #[error("bypass paths require the default-deny policy (no allow or protect set)")]
    BypassRequiresDefaultDeny,

    #[error("path rules must be non-empty")]
    EmptyRule,
}

/// Builder for a gate instance.
///
/// At most one of [`allow_paths`](Self::allow_paths) and
/// [`protect_paths`](Self::protect_paths) may be set; with neither, every
/// path is gated except the literal [`bypass_paths`](Self::bypass_paths).
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    issuers: Vec<IssuerConfig>,
    allow: Vec<String>,
    protect: Vec<String>,
    bypass: Vec<String>,
    header_name: Option<String>,
    cookie_name: Option<String>,
    clock_skew_seconds: u64,
    refresh_policy: RefreshPolicy,
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trust anchor. Registration order is the fallback
    /// verification order.
    #[must_use]
    pub fn issuer(mut self, issuer: IssuerConfig) -> Self {
        self.issuers.push(issuer);
        self
    }

    /// Paths that bypass authentication; everything else is gated.
    #[must_use]
    pub fn allow_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Paths that require authentication; everything else bypasses.
    #[must_use]
    pub fn protect_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protect = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Literal paths open under the default-deny policy. No glob expansion.
    #[must_use]
    pub fn bypass_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bypass = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Override the credential header (default `Authorization`).
    #[must_use]
    pub fn header_name(mut self, name: &str) -> Self {
        self.header_name = Some(name.to_string());
        self
    }

    /// Enable cookie fallback: when the credential header is absent, read
    /// the token from this cookie. Off unless set.
    #[must_use]
    pub fn cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = Some(name.to_string());
        self
    }

    /// Clock skew tolerance in seconds applied to `exp` validation.
    #[must_use]
    pub fn clock_skew_seconds(mut self, seconds: u64) -> Self {
        self.clock_skew_seconds = seconds;
        self
    }

    /// Key-set cache refresh policy (default: 5 minute TTL).
    #[must_use]
    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Validate the configuration and build the request-time state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if both allow and protect sets are configured,
    /// bypass paths are combined with an explicit policy, two issuers share
    /// an `issuer` value, no issuer is registered, or a rule is empty.
    pub fn build(self) -> Result<GateState, ConfigError> {
        if !self.allow.is_empty() && !self.protect.is_empty() {
            return Err(ConfigError::ConflictingPolicies);
        }
        if !self.bypass.is_empty() && (!self.allow.is_empty() || !self.protect.is_empty()) {
            return Err(ConfigError::BypassRequiresDefaultDeny);
        }
        if self.issuers.is_empty() {
            return Err(ConfigError::NoIssuers);
        }

        let policy = if !self.allow.is_empty() {
            AccessPolicy::Allow(compile_rules(&self.allow)?)
        } else if !self.protect.is_empty() {
            AccessPolicy::Protect(compile_rules(&self.protect)?)
        } else {
            for path in &self.bypass {
                if path.is_empty() {
                    return Err(ConfigError::EmptyRule);
                }
            }
            AccessPolicy::DenyAll {
                bypass: self.bypass,
            }
        };

        let registry = IssuerRegistry::new(self.issuers)?;
        let key_sets = Arc::new(KeySetCache::new(self.refresh_policy));
        let verifier = TokenVerifier::new(Arc::clone(&key_sets), self.clock_skew_seconds);

        Ok(GateState::new(
            registry,
            verifier,
            policy,
            self.header_name
                .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string()),
            self.cookie_name,
        ))
    }
}

fn compile_rules(patterns: &[String]) -> Result<Vec<PathRule>, ConfigError> {
    patterns.iter().map(|p| PathRule::new(p)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::AccessPolicy;

    fn issuer(name: &str, iss: &str) -> IssuerConfig {
        IssuerConfig {
            name: name.to_string(),
            authority: format!("https://{name}.example/"),
            audience: format!("api://{name}"),
            issuer: iss.to_string(),
            jwks_uri: format!("https://{name}.example/.well-known/jwks.json"),
        }
    }

    #[test]
    fn test_build_with_allow_paths() {
        let state = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .allow_paths(["/public", "/docs/*"])
            .build()
            .expect("config should build");

        assert!(matches!(state.policy(), AccessPolicy::Allow(rules) if rules.len() == 2));
        assert_eq!(state.header_name(), DEFAULT_HEADER_NAME);
        assert!(state.cookie_name().is_none());
    }

    #[test]
    fn test_build_with_protect_paths() {
        let state = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .protect_paths(["/secure"])
            .build()
            .expect("config should build");

        assert!(matches!(state.policy(), AccessPolicy::Protect(rules) if rules.len() == 1));
    }

    #[test]
    fn test_build_default_deny_with_bypass() {
        let state = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .bypass_paths(["/health"])
            .build()
            .expect("config should build");

        assert!(matches!(
            state.policy(),
            AccessPolicy::DenyAll { bypass } if bypass == &["/health".to_string()]
        ));
    }

    #[test]
    fn test_conflicting_policies_rejected() {
        let result = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .allow_paths(["/public"])
            .protect_paths(["/secure"])
            .build();

        assert!(matches!(result, Err(ConfigError::ConflictingPolicies)));
    }

    #[test]
    fn test_bypass_with_explicit_policy_rejected() {
        let result = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .protect_paths(["/secure"])
            .bypass_paths(["/health"])
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::BypassRequiresDefaultDeny)
        ));
    }

    #[test]
    fn test_duplicate_issuer_rejected() {
        let result = GateConfig::new()
            .issuer(issuer("a", "https://same.example/"))
            .issuer(issuer("b", "https://same.example/"))
            .build();

        assert!(
            matches!(result, Err(ConfigError::DuplicateIssuer(iss)) if iss == "https://same.example/")
        );
    }

    #[test]
    fn test_no_issuers_rejected() {
        let result = GateConfig::new().protect_paths(["/secure"]).build();
        assert!(matches!(result, Err(ConfigError::NoIssuers)));
    }

    #[test]
    fn test_empty_rule_rejected() {
        let result = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .allow_paths([""])
            .build();

        assert!(matches!(result, Err(ConfigError::EmptyRule)));
    }

    #[test]
    fn test_header_and_cookie_overrides() {
        let state = GateConfig::new()
            .issuer(issuer("a", "https://a.example/"))
            .protect_paths(["/secure"])
            .header_name("X-Auth-Token")
            .cookie_name("session_token")
            .build()
            .expect("config should build");

        assert_eq!(state.header_name(), "X-Auth-Token");
        assert_eq!(state.cookie_name(), Some("session_token"));
    }
}
