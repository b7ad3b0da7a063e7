//! Custom endpoint data model
//!
//! An [`EndpointDescriptor`] is built fresh from the property bag on every
//! invocation and dropped on return; the control plane is the only place
//! endpoint state lives between calls.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which cluster members are eligible for an endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EndpointType {
    /// Read-only replicas only
    Reader,
    /// Read/write instances only (multi-writer clusters)
    Writer,
    /// Any instance, primary or replica
    #[default]
    Any,
}

impl EndpointType {
    /// Wire representation used by the control plane
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Reader => "READER",
            EndpointType::Writer => "WRITER",
            EndpointType::Any => "ANY",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "READER" => Ok(EndpointType::Reader),
            "WRITER" => Ok(EndpointType::Writer),
            "ANY" => Ok(EndpointType::Any),
            _ => Err(Error::validation(format!(
                "unknown endpoint type '{}', expected one of READER, WRITER, ANY",
                s
            ))),
        }
    }
}

/// Member selection policy for an endpoint
///
/// `Exclude` and `Include` are never empty: the constructors collapse an
/// empty set to `All`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MemberSelection {
    /// Every eligible member (service default)
    #[default]
    All,
    /// Every eligible member except the listed instances
    Exclude(BTreeSet<String>),
    /// Only the listed instances
    Include(BTreeSet<String>),
}

/// Member lists as sent to the control plane; at most one side is populated
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberLists {
    /// Instances that make up the endpoint (Include)
    pub static_members: Option<Vec<String>>,
    /// Instances kept out of the endpoint (Exclude)
    pub excluded_members: Option<Vec<String>>,
}

impl MemberSelection {
    /// Select every eligible member
    pub fn all() -> Self {
        MemberSelection::All
    }

    /// Select every eligible member except `ids`
    pub fn exclude<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            MemberSelection::All
        } else {
            MemberSelection::Exclude(ids)
        }
    }

    /// Select only `ids`
    pub fn include<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            MemberSelection::All
        } else {
            MemberSelection::Include(ids)
        }
    }

    /// Encode as the pair of member lists the control plane accepts
    pub fn wire_lists(&self) -> MemberLists {
        match self {
            MemberSelection::All => MemberLists::default(),
            MemberSelection::Exclude(ids) => MemberLists {
                static_members: None,
                excluded_members: Some(ids.iter().cloned().collect()),
            },
            MemberSelection::Include(ids) => MemberLists {
                static_members: Some(ids.iter().cloned().collect()),
                excluded_members: None,
            },
        }
    }

    /// Decode from the wire member lists
    ///
    /// Empty lists are treated as absent. Both lists populated is rejected.
    pub fn from_wire(
        static_members: Option<Vec<String>>,
        excluded_members: Option<Vec<String>>,
    ) -> Result<Self> {
        let static_members = static_members.filter(|ids| !ids.is_empty());
        let excluded_members = excluded_members.filter(|ids| !ids.is_empty());

        match (static_members, excluded_members) {
            (Some(_), Some(_)) => Err(Error::validation_for_field(
                crate::error::UNKNOWN_CONTEXT,
                "StaticMembers",
                "StaticMembers and ExcludedMembers are mutually exclusive",
            )),
            (Some(ids), None) => Ok(MemberSelection::include(ids)),
            (None, Some(ids)) => Ok(MemberSelection::exclude(ids)),
            (None, None) => Ok(MemberSelection::All),
        }
    }
}

/// Immutable description of one custom endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Identifier of the parent cluster
    pub cluster_identifier: String,
    /// Identifier of the endpoint, as requested
    pub endpoint_identifier: String,
    /// Eligible member type
    pub endpoint_type: EndpointType,
    /// Member selection policy
    pub members: MemberSelection,
}

impl EndpointDescriptor {
    /// Create a new descriptor
    pub fn new(
        cluster_identifier: impl Into<String>,
        endpoint_identifier: impl Into<String>,
        endpoint_type: EndpointType,
        members: MemberSelection,
    ) -> Self {
        Self {
            cluster_identifier: cluster_identifier.into(),
            endpoint_identifier: endpoint_identifier.into(),
            endpoint_type,
            members,
        }
    }

    /// The identifier as the control plane stores it (lowercase)
    pub fn normalized_identifier(&self) -> String {
        self.endpoint_identifier.to_ascii_lowercase()
    }
}

/// Control-plane state of an endpoint at one point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndpointStatus {
    /// Being created
    Creating,
    /// Ready to accept connections
    Available,
    /// Member or type change in progress
    Modifying,
    /// Being deleted
    Deleting,
    /// Record is gone
    Deleted,
    /// Stable, but no eligible members are attached
    Inactive,
    /// A value this version does not know about
    Unknown(String),
}

impl EndpointStatus {
    /// Classify the status reported for an endpoint; no record means `Deleted`
    pub fn observed(status: Option<&str>) -> Self {
        match status {
            Some(s) => Self::parse(s),
            None => EndpointStatus::Deleted,
        }
    }

    /// Parse a status string reported by the control plane
    pub fn parse(status: &str) -> Self {
        match status {
            "creating" => EndpointStatus::Creating,
            "available" => EndpointStatus::Available,
            "modifying" => EndpointStatus::Modifying,
            "deleting" => EndpointStatus::Deleting,
            "deleted" => EndpointStatus::Deleted,
            "inactive" => EndpointStatus::Inactive,
            other => EndpointStatus::Unknown(other.to_string()),
        }
    }

    /// Whether the endpoint has stopped transitioning
    ///
    /// Unknown values are never settled so polling keeps going.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            EndpointStatus::Available | EndpointStatus::Inactive | EndpointStatus::Deleted
        )
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            EndpointStatus::Creating => "creating",
            EndpointStatus::Available => "available",
            EndpointStatus::Modifying => "modifying",
            EndpointStatus::Deleting => "deleting",
            EndpointStatus::Deleted => "deleted",
            EndpointStatus::Inactive => "inactive",
            EndpointStatus::Unknown(s) => s,
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired-state transition requested by the provisioning system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Bring a new endpoint into existence
    Create,
    /// Overwrite the endpoint's type and members
    Update,
    /// Remove the endpoint
    Delete,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        };
        f.write_str(s)
    }
}

/// A lifecycle event carrying the current descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Create the endpoint
    Create(EndpointDescriptor),
    /// Apply the descriptor as a full replacement
    Update(EndpointDescriptor),
    /// Delete the endpoint
    Delete(EndpointDescriptor),
}

impl LifecycleEvent {
    /// Pair a request type with its descriptor
    pub fn new(request_type: RequestType, descriptor: EndpointDescriptor) -> Self {
        match request_type {
            RequestType::Create => LifecycleEvent::Create(descriptor),
            RequestType::Update => LifecycleEvent::Update(descriptor),
            RequestType::Delete => LifecycleEvent::Delete(descriptor),
        }
    }

    /// The request type of this event
    pub fn request_type(&self) -> RequestType {
        match self {
            LifecycleEvent::Create(_) => RequestType::Create,
            LifecycleEvent::Update(_) => RequestType::Update,
            LifecycleEvent::Delete(_) => RequestType::Delete,
        }
    }

    /// The descriptor carried by this event
    pub fn descriptor(&self) -> &EndpointDescriptor {
        match self {
            LifecycleEvent::Create(d) | LifecycleEvent::Update(d) | LifecycleEvent::Delete(d) => d,
        }
    }
}
