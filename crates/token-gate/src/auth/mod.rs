//! Credential verification: issuer registry, key-set cache, token verifier.
//!
//! # Components
//!
//! - `token` - unverified peeks at raw tokens (key id, issuer claim)
//! - `registry` - ordered, immutable set of configured trust anchors
//! - `jwks` - key-set cache keyed by JWKS URI
//! - `verifier` - RS256 verification against one issuer
//! - `claims` - the verified identity attached to requests

pub mod claims;
pub mod jwks;
pub mod registry;
pub mod token;
pub mod verifier;

pub use claims::{IdentityExt, VerifiedIdentity};
pub use jwks::{KeySetCache, RefreshPolicy};
pub use registry::IssuerRegistry;
pub use verifier::TokenVerifier;
