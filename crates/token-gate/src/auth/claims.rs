//! Verified identity attached to authenticated requests.
//!
//! The claim payload is an arbitrary map; downstream handlers read whichever
//! claims they need. Debug output prints claim names only, since claim
//! values routinely carry user identifiers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The fully verified claim set of an authenticated request.
///
/// Inserted into the request's extensions by the gate middleware; handlers
/// read it via `Extension<VerifiedIdentity>` or [`IdentityExt`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedIdentity {
    claims: Map<String, Value>,
}

impl VerifiedIdentity {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// All claims.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// One claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The `sub` claim, when present as a string.
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    /// The `iss` claim, when present as a string.
    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }

    /// Consume into the underlying claim map.
    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }
}

/// Claim values are not printed; names only.
impl fmt::Debug for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.claims.keys().map(String::as_str).collect();
        f.debug_struct("VerifiedIdentity")
            .field("claims", &names)
            .finish()
    }
}

/// Extension trait for reading the verified identity off a request.
pub trait IdentityExt {
    /// The authenticated identity, or `None` if the gate middleware did not
    /// run (or passed the request through an open path).
    fn identity(&self) -> Option<&VerifiedIdentity>;
}

impl<B> IdentityExt for axum::extract::Request<B> {
    fn identity(&self) -> Option<&VerifiedIdentity> {
        self.extensions().get::<VerifiedIdentity>()
    }
}
