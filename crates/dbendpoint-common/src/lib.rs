//! Common types for dbendpoint: endpoint descriptor, status taxonomy, errors

#![deny(missing_docs)]

pub mod endpoint;
pub mod error;
pub mod properties;
pub mod telemetry;

pub use endpoint::{
    EndpointDescriptor, EndpointStatus, EndpointType, LifecycleEvent, MemberLists,
    MemberSelection, RequestType,
};
pub use error::Error;
pub use properties::EndpointProperties;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Service error code returned when the endpoint record does not exist
pub const ENDPOINT_NOT_FOUND_CODE: &str = "DBClusterEndpointNotFoundFault";

/// Output attribute carrying the endpoint's connection hostname
pub const ENDPOINT_ATTRIBUTE: &str = "Endpoint";

/// Output attribute carrying the normalized endpoint identifier
pub const ENDPOINT_IDENTIFIER_ATTRIBUTE: &str = "DBClusterEndpointIdentifier";
