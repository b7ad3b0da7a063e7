//! Error types for custom endpoint lifecycle operations
//!
//! Errors carry the endpoint identifier and, for control-plane failures, the
//! service error code so the caller can decide whether a retry makes sense.
//! Nothing in this workspace retries on its own.

use thiserror::Error;

use crate::ENDPOINT_NOT_FOUND_CODE;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for endpoint lifecycle operations
#[derive(Debug, Error)]
pub enum Error {
    /// The property bag is missing fields or carries conflicting values
    #[error("validation error for {endpoint}: {message}")]
    Validation {
        /// Endpoint identifier, if it could be read
        endpoint: String,
        /// Description of what's invalid
        message: String,
        /// The invalid property (e.g., "StaticMembers")
        field: Option<String>,
    },

    /// The control plane rejected the call or could not be reached
    #[error("control plane error [{operation}] for {endpoint}: {message}")]
    ControlPlane {
        /// API operation that failed (e.g., "CreateDBClusterEndpoint")
        operation: String,
        /// Endpoint identifier the call was made for
        endpoint: String,
        /// Service error code, when the service returned one
        code: Option<String>,
        /// Description of what failed
        message: String,
        /// Whether the same call may succeed if repeated
        retryable: bool,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a validation error without endpoint context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            endpoint: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with endpoint context and property name
    pub fn validation_for_field(
        endpoint: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            endpoint: endpoint.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a non-retryable control-plane rejection
    pub fn control_plane(
        operation: impl Into<String>,
        endpoint: impl Into<String>,
        code: Option<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ControlPlane {
            operation: operation.into(),
            endpoint: endpoint.into(),
            code,
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a retryable control-plane failure (timeout, transport, throttling)
    pub fn control_plane_transient(
        operation: impl Into<String>,
        endpoint: impl Into<String>,
        code: Option<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ControlPlane {
            operation: operation.into(),
            endpoint: endpoint.into(),
            code,
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Attach an endpoint identifier to a validation error raised without one
    pub fn for_endpoint(self, endpoint: &str) -> Self {
        match self {
            Error::Validation {
                endpoint: current,
                message,
                field,
            } if current == UNKNOWN_CONTEXT => Error::Validation {
                endpoint: endpoint.to_string(),
                message,
                field,
            },
            other => other,
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation and serialization errors need a config fix, never a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Validation { .. } => false,
            Error::ControlPlane { retryable, .. } => *retryable,
            Error::Serialization { .. } => false,
        }
    }

    /// Check if the control plane reported that the endpoint does not exist
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ENDPOINT_NOT_FOUND_CODE)
    }

    /// Get the service error code, if the control plane returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::ControlPlane { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Get the endpoint identifier if this error is associated with one
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Error::Validation { endpoint, .. } => Some(endpoint),
            Error::ControlPlane { endpoint, .. } => Some(endpoint),
            Error::Serialization { .. } => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
