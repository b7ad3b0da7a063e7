//! Environment configuration for the RDS client
//!
//! Region and endpoint override come from the environment through a trait so
//! tests never touch process-global state.

/// Environment variable naming an alternate RDS API endpoint
pub const ENDPOINT_URL_ENV: &str = "DBENDPOINT_RDS_ENDPOINT_URL";

/// Trait for reading RDS client settings from the environment
#[cfg_attr(test, mockall::automock)]
pub trait RdsEnvConfig: Send + Sync {
    /// Region from `AWS_REGION`
    fn region(&self) -> Option<String>;

    /// Alternate API endpoint (local stacks, VPC endpoints)
    fn endpoint_url(&self) -> Option<String>;
}

/// Default implementation that reads from environment variables
#[derive(Clone, Default)]
pub struct OsEnvConfig;

impl RdsEnvConfig for OsEnvConfig {
    fn region(&self) -> Option<String> {
        std::env::var("AWS_REGION").ok()
    }

    fn endpoint_url(&self) -> Option<String> {
        std::env::var(ENDPOINT_URL_ENV).ok()
    }
}

/// Resolved RDS client settings
///
/// `None` leaves the value to the SDK's default provider chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RdsConfig {
    /// Region override
    pub region: Option<String>,
    /// API endpoint override
    pub endpoint_url: Option<String>,
}

impl RdsConfig {
    /// Read settings from the environment, ignoring blank values
    pub fn from_env(env: &dyn RdsEnvConfig) -> Self {
        Self {
            region: non_blank(env.region()),
            endpoint_url: non_blank(env.endpoint_url()),
        }
    }

    /// Apply explicit overrides (CLI flags) on top of these settings
    pub fn with_overrides(self, region: Option<String>, endpoint_url: Option<String>) -> Self {
        Self {
            region: non_blank(region).or(self.region),
            endpoint_url: non_blank(endpoint_url).or(self.endpoint_url),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
