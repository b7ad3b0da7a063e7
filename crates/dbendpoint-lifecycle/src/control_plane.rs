//! Control-plane seam
//!
//! The dispatcher and poller talk to the owning service only through
//! [`ControlPlane`]. Requests are built from an [`EndpointDescriptor`] so the
//! field lists live in one place; implementations own transport and auth.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(test)]
use mockall::automock;

use dbendpoint_common::{
    EndpointDescriptor, EndpointStatus, EndpointType, Error, MemberLists, Result,
};

/// Create a custom endpoint on a cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateEndpointRequest {
    /// Parent cluster
    pub cluster_identifier: String,
    /// Endpoint to create
    pub endpoint_identifier: String,
    /// Eligible member type
    pub endpoint_type: EndpointType,
    /// Include or exclude list, at most one populated
    pub members: MemberLists,
}

impl From<&EndpointDescriptor> for CreateEndpointRequest {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        Self {
            cluster_identifier: descriptor.cluster_identifier.clone(),
            endpoint_identifier: descriptor.endpoint_identifier.clone(),
            endpoint_type: descriptor.endpoint_type,
            members: descriptor.members.wire_lists(),
        }
    }
}

/// Overwrite an endpoint's type and members
///
/// Always carries every mutable field; the service treats it as a full
/// replacement, never a patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifyEndpointRequest {
    /// Endpoint to modify
    pub endpoint_identifier: String,
    /// Eligible member type
    pub endpoint_type: EndpointType,
    /// Include or exclude list, at most one populated
    pub members: MemberLists,
}

impl From<&EndpointDescriptor> for ModifyEndpointRequest {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        Self {
            endpoint_identifier: descriptor.endpoint_identifier.clone(),
            endpoint_type: descriptor.endpoint_type,
            members: descriptor.members.wire_lists(),
        }
    }
}

/// Delete an endpoint, keyed only by identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteEndpointRequest {
    /// Endpoint to delete
    pub endpoint_identifier: String,
}

impl From<&EndpointDescriptor> for DeleteEndpointRequest {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        Self {
            endpoint_identifier: descriptor.endpoint_identifier.clone(),
        }
    }
}

/// Read endpoints filtered by cluster and identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescribeEndpointsRequest {
    /// Parent cluster
    pub cluster_identifier: String,
    /// Endpoint to look up
    pub endpoint_identifier: String,
}

impl From<&EndpointDescriptor> for DescribeEndpointsRequest {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        Self {
            cluster_identifier: descriptor.cluster_identifier.clone(),
            endpoint_identifier: descriptor.endpoint_identifier.clone(),
        }
    }
}

/// An endpoint as reported by the control plane
///
/// Serializes with the service's own field names; this is the raw response
/// handed back to the provisioning system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Endpoint identifier (lowercase)
    #[serde(rename = "DBClusterEndpointIdentifier")]
    pub endpoint_identifier: String,

    /// Parent cluster
    #[serde(
        rename = "DBClusterIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_identifier: Option<String>,

    /// Immutable service-assigned resource id
    #[serde(
        rename = "DBClusterEndpointResourceIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_identifier: Option<String>,

    /// Connection hostname
    #[serde(rename = "Endpoint", default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Raw status string
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Endpoint type (CUSTOM for custom endpoints)
    #[serde(rename = "EndpointType", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,

    /// Custom endpoint type (READER, WRITER, ANY)
    #[serde(
        rename = "CustomEndpointType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_endpoint_type: Option<String>,

    /// Include list
    #[serde(rename = "StaticMembers", default, skip_serializing_if = "Vec::is_empty")]
    pub static_members: Vec<String>,

    /// Exclude list
    #[serde(rename = "ExcludedMembers", default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_members: Vec<String>,

    /// Endpoint ARN
    #[serde(
        rename = "DBClusterEndpointArn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub arn: Option<String>,
}

impl EndpointRecord {
    /// Classified status of this record
    pub fn status(&self) -> EndpointStatus {
        EndpointStatus::observed(self.status.as_deref())
    }

    /// Encode as a response data map
    pub fn into_data(self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::serialization(format!(
                "endpoint record encoded as {} instead of an object",
                other
            ))),
        }
    }
}

/// Trait abstracting the owning service's control-plane API
///
/// Each call is a single request/response; implementations must not retry
/// beyond what their transport does on its own.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Create a custom endpoint; the returned record is still in flight
    async fn create_endpoint(&self, request: &CreateEndpointRequest) -> Result<EndpointRecord>;

    /// Replace an endpoint's type and members
    async fn modify_endpoint(&self, request: &ModifyEndpointRequest) -> Result<EndpointRecord>;

    /// Delete an endpoint; fails if it does not exist
    async fn delete_endpoint(&self, request: &DeleteEndpointRequest) -> Result<EndpointRecord>;

    /// List endpoints matching the filter; empty when none match
    async fn describe_endpoints(
        &self,
        request: &DescribeEndpointsRequest,
    ) -> Result<Vec<EndpointRecord>>;
}
