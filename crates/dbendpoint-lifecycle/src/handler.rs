//! Provider-framework boundary
//!
//! The provisioning system's provider framework calls two functions:
//! `onEvent` once per desired-state change and `isComplete` on a fixed
//! schedule until it reports done. Both receive the same event envelope with
//! the endpoint's property bag; both are stateless.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use dbendpoint_common::{
    EndpointDescriptor, LifecycleEvent, RequestType, Result, ENDPOINT_ATTRIBUTE,
    ENDPOINT_IDENTIFIER_ATTRIBUTE,
};

use crate::dispatcher::EventDispatcher;
use crate::poller::{CompletionPoller, Convergence};

/// Event envelope delivered by the provider framework
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderEvent {
    /// Create, Update or Delete
    pub request_type: RequestType,

    /// Endpoint property bag
    #[serde(default)]
    pub resource_properties: Map<String, Value>,

    /// Physical id assigned by a previous `on_event` (absent on Create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    /// Request id, for log correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Logical id of the resource in its template, for log correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
}

impl ProviderEvent {
    /// Build an event for a descriptor
    pub fn new(request_type: RequestType, descriptor: &EndpointDescriptor) -> Result<Self> {
        Ok(Self {
            request_type,
            resource_properties: descriptor.to_properties()?,
            physical_resource_id: None,
            request_id: None,
            logical_resource_id: None,
        })
    }

    /// Decode and validate into a lifecycle event
    pub fn lifecycle_event(&self) -> Result<LifecycleEvent> {
        let descriptor = EndpointDescriptor::from_properties(&self.resource_properties)?;
        Ok(LifecycleEvent::new(self.request_type, descriptor))
    }
}

/// Response to `on_event`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OnEventResponse {
    /// Physical id of the endpoint resource
    pub physical_resource_id: String,

    /// Raw control-plane response (empty for Delete)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

/// Response to `is_complete`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IsCompleteResponse {
    /// Whether the operation has converged
    pub is_complete: bool,

    /// Output attributes, populated once a Create or Update converges
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

/// Handle one desired-state change
#[instrument(
    skip(dispatcher, event),
    fields(request_id = ?event.request_id, logical_id = ?event.logical_resource_id)
)]
pub async fn on_event(
    dispatcher: &EventDispatcher,
    event: &ProviderEvent,
) -> Result<OnEventResponse> {
    let lifecycle = event.lifecycle_event()?;
    let normalized = lifecycle.descriptor().normalized_identifier();

    let data = match dispatcher.dispatch(&lifecycle).await? {
        Some(record) => record.into_data()?,
        None => Map::new(),
    };

    let physical_resource_id = match lifecycle {
        LifecycleEvent::Delete(_) => event
            .physical_resource_id
            .clone()
            .unwrap_or(normalized),
        LifecycleEvent::Create(_) | LifecycleEvent::Update(_) => normalized,
    };

    Ok(OnEventResponse {
        physical_resource_id,
        data,
    })
}

/// Check whether the operation started by `on_event` has converged
#[instrument(
    skip(poller, event),
    fields(request_id = ?event.request_id, logical_id = ?event.logical_resource_id)
)]
pub async fn is_complete(
    poller: &CompletionPoller,
    event: &ProviderEvent,
) -> Result<IsCompleteResponse> {
    let lifecycle = event.lifecycle_event()?;
    let convergence = poller.poll(&lifecycle).await?;

    let mut data = Map::new();
    if let Convergence::Complete {
        record: Some(record),
        ..
    } = &convergence
    {
        if lifecycle.request_type() != RequestType::Delete {
            if let Some(hostname) = &record.endpoint {
                data.insert(ENDPOINT_ATTRIBUTE.to_string(), Value::from(hostname.as_str()));
            }
            data.insert(
                ENDPOINT_IDENTIFIER_ATTRIBUTE.to_string(),
                Value::from(record.endpoint_identifier.as_str()),
            );
            info!(endpoint = %record.endpoint_identifier, "exposing endpoint output attributes");
        }
    }

    Ok(IsCompleteResponse {
        is_complete: convergence.is_complete(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::control_plane::{EndpointRecord, MockControlPlane};
    use dbendpoint_common::Error;

    fn provider_event(request_type: &str, properties: Value) -> ProviderEvent {
        serde_json::from_value(json!({
            "RequestType": request_type,
            "RequestId": "8f3c2e1a",
            "LogicalResourceId": "AnalyticalQueryEndpoint",
            "ResourceProperties": properties,
        }))
        .unwrap()
    }

    fn analytics_properties() -> Value {
        json!({
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:provider",
            "DBClusterIdentifier": "aurora-main",
            "DBClusterEndpointIdentifier": "Analytics",
            "EndpointType": "READER",
            "StaticMembers": ["i1", "i2"]
        })
    }

    fn available_record() -> EndpointRecord {
        EndpointRecord {
            endpoint_identifier: "analytics".to_string(),
            cluster_identifier: Some("aurora-main".to_string()),
            endpoint: Some("analytics.cluster-custom-abc.us-east-1.rds.amazonaws.com".to_string()),
            status: Some("available".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn provider_event_parses_framework_envelope() {
        let event = provider_event("Update", analytics_properties());
        assert_eq!(event.request_type, RequestType::Update);
        assert_eq!(event.request_id.as_deref(), Some("8f3c2e1a"));
        assert!(event.physical_resource_id.is_none());
        assert!(event.lifecycle_event().is_ok());
    }

    #[tokio::test]
    async fn on_event_create_returns_raw_response_and_normalized_id() {
        let mut mock = MockControlPlane::new();
        mock.expect_create_endpoint().times(1).returning(|_| {
            Ok(EndpointRecord {
                endpoint_identifier: "analytics".to_string(),
                status: Some("creating".to_string()),
                ..Default::default()
            })
        });
        let dispatcher = EventDispatcher::new(Arc::new(mock));

        let response = on_event(&dispatcher, &provider_event("Create", analytics_properties()))
            .await
            .unwrap();

        assert_eq!(response.physical_resource_id, "analytics");
        assert_eq!(response.data["Status"], "creating");
    }

    #[tokio::test]
    async fn on_event_delete_echoes_physical_id_with_empty_data() {
        let mut mock = MockControlPlane::new();
        mock.expect_delete_endpoint()
            .times(1)
            .returning(|_| Ok(EndpointRecord::default()));
        let dispatcher = EventDispatcher::new(Arc::new(mock));

        let mut event = provider_event("Delete", analytics_properties());
        event.physical_resource_id = Some("analytics".to_string());

        let response = on_event(&dispatcher, &event).await.unwrap();
        assert_eq!(response.physical_resource_id, "analytics");
        assert!(response.data.is_empty());

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body, json!({ "PhysicalResourceId": "analytics" }));
    }

    #[tokio::test]
    async fn invalid_properties_fail_before_any_call() {
        // No expectations: any control-plane call would panic the mock
        let dispatcher = EventDispatcher::new(Arc::new(MockControlPlane::new()));
        let properties = json!({
            "DBClusterIdentifier": "aurora-main",
            "DBClusterEndpointIdentifier": "analytics",
            "StaticMembers": ["i1"],
            "ExcludedMembers": ["i2"]
        });

        let err = on_event(&dispatcher, &provider_event("Create", properties))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn is_complete_exposes_output_attributes_on_create() {
        let mut mock = MockControlPlane::new();
        mock.expect_describe_endpoints()
            .returning(|_| Ok(vec![available_record()]));
        let poller = CompletionPoller::new(Arc::new(mock));

        let response = is_complete(&poller, &provider_event("Create", analytics_properties()))
            .await
            .unwrap();

        assert!(response.is_complete);
        assert_eq!(
            response.data[ENDPOINT_ATTRIBUTE],
            "analytics.cluster-custom-abc.us-east-1.rds.amazonaws.com"
        );
        assert_eq!(response.data[ENDPOINT_IDENTIFIER_ATTRIBUTE], "analytics");
    }

    #[tokio::test]
    async fn is_complete_while_creating_has_no_data() {
        let mut mock = MockControlPlane::new();
        mock.expect_describe_endpoints().returning(|_| {
            Ok(vec![EndpointRecord {
                status: Some("creating".to_string()),
                ..available_record()
            }])
        });
        let poller = CompletionPoller::new(Arc::new(mock));

        let response = is_complete(&poller, &provider_event("Create", analytics_properties()))
            .await
            .unwrap();

        assert!(!response.is_complete);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "IsComplete": false })
        );
    }

    #[tokio::test]
    async fn is_complete_on_delete_reports_no_attributes() {
        let mut mock = MockControlPlane::new();
        mock.expect_describe_endpoints().returning(|_| Ok(vec![]));
        let poller = CompletionPoller::new(Arc::new(mock));

        let response = is_complete(&poller, &provider_event("Delete", analytics_properties()))
            .await
            .unwrap();

        assert!(response.is_complete);
        assert!(response.data.is_empty());
    }
}
