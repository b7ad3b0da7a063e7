//! Property-bag encoding of an endpoint descriptor
//!
//! The provisioning system hands both the dispatcher and the poller the same
//! string-keyed bag. [`EndpointProperties`] is the single schema for that bag,
//! used in both directions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::endpoint::{EndpointDescriptor, EndpointType, MemberSelection};
use crate::{Error, Result};

/// Property key for the parent cluster identifier
pub const CLUSTER_IDENTIFIER_KEY: &str = "DBClusterIdentifier";
/// Property key for the endpoint identifier
pub const ENDPOINT_IDENTIFIER_KEY: &str = "DBClusterEndpointIdentifier";
/// Property key for the endpoint type
pub const ENDPOINT_TYPE_KEY: &str = "EndpointType";
/// Property key for the Include member list
pub const STATIC_MEMBERS_KEY: &str = "StaticMembers";
/// Property key for the Exclude member list
pub const EXCLUDED_MEMBERS_KEY: &str = "ExcludedMembers";

/// Raw, unvalidated view of the property bag
///
/// Keys the schema does not name (e.g. `ServiceToken`) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProperties {
    /// Parent cluster identifier
    #[serde(
        rename = "DBClusterIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_identifier: Option<String>,

    /// Endpoint identifier
    #[serde(
        rename = "DBClusterEndpointIdentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint_identifier: Option<String>,

    /// Endpoint type (READER, WRITER, ANY)
    #[serde(rename = "EndpointType", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,

    /// Include list
    #[serde(rename = "StaticMembers", default, skip_serializing_if = "Option::is_none")]
    pub static_members: Option<Vec<String>>,

    /// Exclude list
    #[serde(
        rename = "ExcludedMembers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub excluded_members: Option<Vec<String>>,
}

impl EndpointProperties {
    /// Read the schema fields out of a property bag
    pub fn from_map(properties: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(properties.clone()))
            .map_err(|e| Error::validation(format!("invalid endpoint properties: {}", e)))
    }

    /// Encode as a property bag
    pub fn into_map(self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::serialization(format!(
                "endpoint properties encoded as {} instead of an object",
                other
            ))),
        }
    }

    /// Validate into a descriptor
    pub fn into_descriptor(self) -> Result<EndpointDescriptor> {
        let endpoint_identifier = required(self.endpoint_identifier, ENDPOINT_IDENTIFIER_KEY, None)?;
        let cluster_identifier = required(
            self.cluster_identifier,
            CLUSTER_IDENTIFIER_KEY,
            Some(endpoint_identifier.as_str()),
        )?;

        let endpoint_type = match self.endpoint_type.as_deref() {
            Some(raw) => raw.parse::<EndpointType>().map_err(|_| {
                Error::validation_for_field(
                    &endpoint_identifier,
                    ENDPOINT_TYPE_KEY,
                    format!("unknown endpoint type '{}'", raw),
                )
            })?,
            None => EndpointType::default(),
        };

        let members = MemberSelection::from_wire(self.static_members, self.excluded_members)
            .map_err(|e| e.for_endpoint(&endpoint_identifier))?;

        Ok(EndpointDescriptor {
            cluster_identifier,
            endpoint_identifier,
            endpoint_type,
            members,
        })
    }
}

impl From<&EndpointDescriptor> for EndpointProperties {
    fn from(descriptor: &EndpointDescriptor) -> Self {
        let lists = descriptor.members.wire_lists();
        Self {
            cluster_identifier: Some(descriptor.cluster_identifier.clone()),
            endpoint_identifier: Some(descriptor.endpoint_identifier.clone()),
            endpoint_type: Some(descriptor.endpoint_type.as_str().to_string()),
            static_members: lists.static_members,
            excluded_members: lists.excluded_members,
        }
    }
}

impl EndpointDescriptor {
    /// Decode and validate a descriptor from a property bag
    ///
    /// Fails before any network call if required fields are missing or both
    /// member lists are populated.
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self> {
        EndpointProperties::from_map(properties)?.into_descriptor()
    }

    /// Encode this descriptor as a property bag
    pub fn to_properties(&self) -> Result<Map<String, Value>> {
        EndpointProperties::from(self).into_map()
    }
}

fn required(value: Option<String>, field: &str, endpoint: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::validation_for_field(
            endpoint.unwrap_or(crate::error::UNKNOWN_CONTEXT),
            field,
            format!("{} is required", field),
        )),
    }
}
