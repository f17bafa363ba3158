//! Key-set cache: fetches and memoizes issuer signing keys by JWKS URI.
//!
//! Each configured issuer publishes its public keys as a JSON document with a
//! `keys` array. The cache fetches a document on first use, then serves the
//! parsed set until the refresh policy considers it stale or an operator
//! invalidates it.
//!
//! # Security
//!
//! - Failed fetches are never cached; the next request retries
//! - Keys are cached to reduce load on issuers and keep verification local
//! - HTTPS should be used in production (enforced by deployment config)

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Network timeout for a single JWKS fetch, in seconds.
const FETCH_TIMEOUT_SECONDS: u64 = 10;

/// When a cached key set is considered stale.
#[derive(Debug, Clone, Copy)]
pub enum RefreshPolicy {
    /// Refetch after the given age. Picks up issuer key rotation without a
    /// process restart.
    Ttl(Duration),

    /// Cache for the lifetime of the process; only
    /// [`KeySetCache::invalidate`] evicts.
    Manual,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy::Ttl(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }
}

/// JSON Web Key from a JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (expected "RSA").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm (expected "RS256" when present).
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (expected "sig" when present).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document as served by an issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

/// One fetched key set, shared between concurrent verifications.
#[derive(Debug)]
pub struct KeySet {
    jwks_uri: String,
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

impl KeySet {
    /// Look up a key by ID.
    pub fn key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    /// The URI this set was fetched from.
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Age of this set.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Errors fetching or parsing a JWKS document.
///
/// These indicate an unreachable or misbehaving trust anchor and are logged
/// server-side at warn level; clients only ever see a generic rejection.
#[derive(Debug, Error)]
pub enum KeySetFetchError {
    #[error("key set endpoint unreachable: {0}")]
    Transport(String),

    #[error("key set endpoint returned status {0}")]
    Http(u16),

    #[error("key set document malformed: {0}")]
    Malformed(String),
}

/// Thread-safe cache of key sets, keyed by JWKS URI.
///
/// Concurrent first-fetches for the same URI may race; the fetch is
/// idempotent and last write wins. No lock is held across the network call.
pub struct KeySetCache {
    http_client: reqwest::Client,
    refresh: RefreshPolicy,
    entries: RwLock<HashMap<String, Arc<KeySet>>>,
}

impl KeySetCache {
    pub fn new(refresh: RefreshPolicy) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "gate.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            refresh,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the key set for a JWKS URI, fetching it if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns `KeySetFetchError` if the document cannot be fetched or
    /// parsed. Failures are not cached; the next call retries.
    #[instrument(skip_all, fields(jwks_uri = %jwks_uri))]
    pub async fn get(&self, jwks_uri: &str) -> Result<Arc<KeySet>, KeySetFetchError> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(jwks_uri) {
                if self.is_fresh(cached) {
                    tracing::debug!(target: "gate.jwks", "Key set cache hit");
                    return Ok(Arc::clone(cached));
                }
            }
        }

        // Cache miss or stale - fetch without holding the lock.
        let fresh = Arc::new(self.fetch(jwks_uri).await?);

        let mut entries = self.entries.write().await;
        entries.insert(jwks_uri.to_string(), Arc::clone(&fresh));

        Ok(fresh)
    }

    /// Evict one cached key set so the next request refetches it.
    ///
    /// Operational hook for issuer-side key rotation.
    pub async fn invalidate(&self, jwks_uri: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(jwks_uri).is_some() {
            tracing::info!(target: "gate.jwks", jwks_uri = %jwks_uri, "Key set cache entry invalidated");
        }
    }

    fn is_fresh(&self, set: &KeySet) -> bool {
        match self.refresh {
            RefreshPolicy::Manual => true,
            RefreshPolicy::Ttl(ttl) => set.age() < ttl,
        }
    }

    async fn fetch(&self, jwks_uri: &str) -> Result<KeySet, KeySetFetchError> {
        tracing::debug!(target: "gate.jwks", jwks_uri = %jwks_uri, "Fetching key set");

        let response = self
            .http_client
            .get(jwks_uri)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "gate.jwks", jwks_uri = %jwks_uri, error = %e, "Failed to fetch key set");
                KeySetFetchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target: "gate.jwks",
                jwks_uri = %jwks_uri,
                status = %status,
                "Key set endpoint returned error"
            );
            return Err(KeySetFetchError::Http(status.as_u16()));
        }

        let document: JwksDocument = response.json().await.map_err(|e| {
            tracing::warn!(target: "gate.jwks", jwks_uri = %jwks_uri, error = %e, "Failed to parse key set document");
            KeySetFetchError::Malformed(e.to_string())
        })?;

        let keys: HashMap<String, Jwk> = document
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "gate.jwks",
            jwks_uri = %jwks_uri,
            key_count = keys.len(),
            "Key set fetched"
        );

        Ok(KeySet {
            jwks_uri: jwks_uri.to_string(),
            keys,
            fetched_at: Instant::now(),
        })
    }
}
