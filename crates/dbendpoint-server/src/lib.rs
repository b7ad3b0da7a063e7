//! HTTP host for the lifecycle functions
//!
//! Exposes `on_event` and `is_complete` as JSON endpoints so a single
//! stateless deployment serves both provider callbacks.

#![deny(missing_docs)]

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};
