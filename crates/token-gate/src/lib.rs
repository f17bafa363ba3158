//! # token-gate
//!
//! Path-policied bearer-token authentication for axum services.
//!
//! For each inbound request the gate decides, from the URL path and a bearer
//! credential, whether the request may proceed; on success it attaches the
//! verified claim set to the request extensions. Multiple trust anchors may
//! be configured; the token's unverified issuer claim narrows which one is
//! tried first, and signing keys are fetched from each issuer's JWKS
//! endpoint and cached.
//!
//! # Usage
//!
//! ```rust,ignore
//! use axum::{middleware, routing::get, Router};
//! use std::sync::Arc;
//! use token_gate::{GateConfig, IssuerConfig};
//!
//! let state = Arc::new(
//!     GateConfig::new()
//!         .issuer(IssuerConfig {
//!             name: "primary".into(),
//!             authority: "https://login.example.com/tenant/".into(),
//!             audience: "api://app".into(),
//!             issuer: "https://issuer.example/".into(),
//!             jwks_uri: "https://issuer.example/.well-known/jwks.json".into(),
//!         })
//!         .protect_paths(["/secure", "/admin/*"])
//!         .build()?,
//! );
//!
//! let app: Router = Router::new()
//!     .route("/secure", get(secure_handler))
//!     .route("/public", get(public_handler))
//!     .layer(middleware::from_fn_with_state(state, token_gate::authenticate));
//! ```
//!
//! # Modules
//!
//! - `config` - construction-time configuration and validation
//! - `policy` - path rules (exact or glob) and the access policy
//! - `auth` - registry, key-set cache, verifier, verified identity
//! - `middleware` - the axum middleware
//! - `errors` - the request-level rejection type

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod policy;

pub use auth::claims::{IdentityExt, VerifiedIdentity};
pub use auth::jwks::{KeySetCache, KeySetFetchError, RefreshPolicy};
pub use auth::registry::IssuerRegistry;
pub use auth::verifier::{ClaimCheck, TokenVerifier, VerificationError};
pub use config::{ConfigError, GateConfig, IssuerConfig};
pub use errors::GateError;
pub use middleware::gate::{authenticate, GateState};
pub use policy::{AccessPolicy, PathRule};
