//! Wiremock-backed issuer harness.
//!
//! Bundles a mock JWKS server, a signing keypair, and the matching
//! `IssuerConfig` so tests can stand up a complete trust anchor in one call.

use crate::crypto_fixtures::TestKeypair;
use crate::token_builders::TestTokenBuilder;
use token_gate::IssuerConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the harness serves its key set under.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A complete test trust anchor: keypair + mock JWKS endpoint + config.
pub struct TestIssuer {
    /// Operator label, also used to derive issuer/audience values.
    pub name: String,

    /// Current signing keypair, published at the JWKS endpoint.
    pub keypair: TestKeypair,

    /// The wiremock server backing the JWKS endpoint.
    pub server: MockServer,

    issuer: String,
    audience: String,
}

impl TestIssuer {
    /// Start a mock issuer named `name`, publishing one fresh RSA key.
    pub async fn start(name: &str) -> Self {
        let server = MockServer::start().await;
        let keypair = TestKeypair::generate(&format!("{name}-key-01"));

        let this = Self {
            name: name.to_string(),
            issuer: format!("https://{name}.example/"),
            audience: format!("api://{name}"),
            keypair,
            server,
        };
        this.publish_current_key().await;
        this
    }

    /// The `iss` value tokens from this issuer carry.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The `aud` value tokens from this issuer carry.
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// The mock JWKS endpoint URL.
    pub fn jwks_uri(&self) -> String {
        format!("{}{JWKS_PATH}", self.server.uri())
    }

    /// The `IssuerConfig` describing this trust anchor.
    pub fn config(&self) -> IssuerConfig {
        IssuerConfig {
            name: self.name.clone(),
            authority: format!("https://{}.example/", self.name),
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
            jwks_uri: self.jwks_uri(),
        }
    }

    /// A claim builder pre-filled with this issuer's `iss` and `aud`.
    pub fn token(&self) -> TestTokenBuilder {
        TestTokenBuilder::new()
            .issued_by(&self.issuer)
            .for_audience(&self.audience)
    }

    /// Sign claims with the current keypair.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        self.keypair.sign(claims)
    }

    /// A validly signed, unexpired token with default claims.
    pub fn valid_token(&self) -> String {
        self.sign(&self.token().build())
    }

    /// Serve the current keypair at the JWKS endpoint.
    pub async fn publish_current_key(&self) {
        self.publish_keys(&[&self.keypair]).await;
    }

    /// Replace the JWKS response with the given keys.
    ///
    /// Resets previously mounted mocks, so this models issuer-side key
    /// rotation: old key IDs disappear from the published document.
    pub async fn publish_keys(&self, keys: &[&TestKeypair]) {
        self.server.reset().await;
        self.mount_jwks(keys, None).await;
    }

    /// Serve the current key and require exactly `hits` fetches.
    ///
    /// The expectation is verified when the mock server drops.
    pub async fn publish_current_key_expecting(&self, hits: u64) {
        self.server.reset().await;
        self.mount_jwks(&[&self.keypair], Some(hits)).await;
    }

    async fn mount_jwks(&self, keys: &[&TestKeypair], expect: Option<u64>) {
        let document = serde_json::json!({
            "keys": keys.iter().map(|k| k.jwk_json()).collect::<Vec<_>>()
        });

        let mut mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&document));

        if let Some(hits) = expect {
            mock = mock.expect(hits);
        }

        mock.mount(&self.server).await;
    }

    /// Serve an error status from the JWKS endpoint.
    pub async fn publish_error(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
