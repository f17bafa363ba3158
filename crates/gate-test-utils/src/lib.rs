//! # Gate Test Utilities
//!
//! Shared test utilities for the token-gate crate.
//!
//! This crate provides:
//! - RSA signing fixtures (`TestKeypair` with JWK export)
//! - Test data builders (`TestTokenBuilder`)
//! - A wiremock-backed issuer harness (`TestIssuer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let issuer = TestIssuer::start("primary").await;
//!
//!     let token = issuer.sign(
//!         &issuer.token().for_subject("alice").expires_in(3600).build(),
//!     );
//!
//!     let state = GateConfig::new()
//!         .issuer(issuer.config())
//!         .protect_paths(["/secure"])
//!         .build()?;
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_harness::*;
pub use token_builders::*;
