//! RDS-backed [`ControlPlane`](dbendpoint_lifecycle::ControlPlane)
//!
//! Wraps the AWS SDK client so the lifecycle core stays independent of
//! transport, credentials and region resolution.

#![deny(missing_docs)]

pub mod client;
pub mod config;

pub use client::RdsControlPlane;
pub use config::{OsEnvConfig, RdsConfig, RdsEnvConfig};
