//! HTTP middleware.
//!
//! # Components
//!
//! - `gate` - the per-request authentication state machine

pub mod gate;

pub use gate::{authenticate, GateState};
