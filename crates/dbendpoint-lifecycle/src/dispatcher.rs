//! Event dispatcher
//!
//! Maps one lifecycle event to exactly one control-plane mutation:
//! - Create → CreateDBClusterEndpoint
//! - Update → ModifyDBClusterEndpoint (full descriptor, never a diff)
//! - Delete → DeleteDBClusterEndpoint (identifier only)
//!
//! No polling, sleeping or retrying happens here. A failed call surfaces
//! immediately; retry policy belongs to the caller.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use dbendpoint_common::{LifecycleEvent, Result};

use crate::control_plane::{
    ControlPlane, CreateEndpointRequest, DeleteEndpointRequest, EndpointRecord,
    ModifyEndpointRequest,
};

/// Issues the single control-plane mutation for a lifecycle event
#[derive(Clone)]
pub struct EventDispatcher {
    control_plane: Arc<dyn ControlPlane>,
}

impl EventDispatcher {
    /// Create a dispatcher over the given control plane
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self { control_plane }
    }

    /// Dispatch one lifecycle event
    ///
    /// Returns the service's acknowledgment for Create and Update, and
    /// nothing for Delete. "Already gone" on Delete is not special-cased.
    #[instrument(
        skip(self, event),
        fields(
            request_type = %event.request_type(),
            endpoint = %event.descriptor().endpoint_identifier,
            cluster = %event.descriptor().cluster_identifier,
        )
    )]
    pub async fn dispatch(&self, event: &LifecycleEvent) -> Result<Option<EndpointRecord>> {
        let outcome = match event {
            LifecycleEvent::Create(descriptor) => {
                let request = CreateEndpointRequest::from(descriptor);
                info!(
                    endpoint_type = %request.endpoint_type,
                    static_members = ?request.members.static_members,
                    excluded_members = ?request.members.excluded_members,
                    "creating custom endpoint"
                );
                self.control_plane
                    .create_endpoint(&request)
                    .await
                    .map(Some)
            }
            LifecycleEvent::Update(descriptor) => {
                let request = ModifyEndpointRequest::from(descriptor);
                info!(
                    endpoint_type = %request.endpoint_type,
                    static_members = ?request.members.static_members,
                    excluded_members = ?request.members.excluded_members,
                    "modifying custom endpoint"
                );
                self.control_plane
                    .modify_endpoint(&request)
                    .await
                    .map(Some)
            }
            LifecycleEvent::Delete(descriptor) => {
                let request = DeleteEndpointRequest::from(descriptor);
                info!("deleting custom endpoint");
                self.control_plane
                    .delete_endpoint(&request)
                    .await
                    .map(|_| None)
            }
        };

        match &outcome {
            Ok(Some(record)) => info!(status = %record.status(), "control plane accepted request"),
            Ok(None) => info!("control plane accepted delete"),
            Err(e) => warn!(
                error = %e,
                retryable = e.is_retryable(),
                "control plane rejected request"
            ),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::MockControlPlane;
    use dbendpoint_common::{
        EndpointDescriptor, EndpointType, Error, MemberLists, MemberSelection,
    };

    fn descriptor(endpoint_type: EndpointType, members: MemberSelection) -> EndpointDescriptor {
        EndpointDescriptor::new("aurora-main", "analytics", endpoint_type, members)
    }

    fn record(status: &str) -> EndpointRecord {
        EndpointRecord {
            endpoint_identifier: "analytics".to_string(),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_issues_one_create_call() {
        let mut mock = MockControlPlane::new();
        mock.expect_create_endpoint()
            .times(1)
            .withf(|req| {
                req.cluster_identifier == "aurora-main"
                    && req.endpoint_identifier == "analytics"
                    && req.endpoint_type == EndpointType::Reader
                    && req.members.static_members
                        == Some(vec!["i1".to_string(), "i2".to_string()])
                    && req.members.excluded_members.is_none()
            })
            .returning(|_| Ok(record("creating")));

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Create(descriptor(
            EndpointType::Reader,
            MemberSelection::include(["i1", "i2"]),
        ));

        let response = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(response, Some(record("creating")));
    }

    #[tokio::test]
    async fn update_sends_full_descriptor() {
        let mut mock = MockControlPlane::new();
        mock.expect_modify_endpoint()
            .times(1)
            .withf(|req| {
                req.endpoint_identifier == "analytics"
                    && req.endpoint_type == EndpointType::Any
                    && req.members
                        == MemberLists {
                            static_members: None,
                            excluded_members: Some(vec!["i2".to_string()]),
                        }
            })
            .returning(|_| Ok(record("modifying")));

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Update(descriptor(
            EndpointType::Any,
            MemberSelection::exclude(["i2"]),
        ));

        let response = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(response, Some(record("modifying")));
    }

    #[tokio::test]
    async fn repeated_updates_send_identical_requests() {
        let mut mock = MockControlPlane::new();
        mock.expect_modify_endpoint()
            .times(2)
            .withf(|req| req.members.static_members == Some(vec!["i1".to_string()]))
            .returning(|_| Ok(record("modifying")));

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Update(descriptor(
            EndpointType::Reader,
            MemberSelection::include(["i1"]),
        ));

        dispatcher.dispatch(&event).await.unwrap();
        dispatcher.dispatch(&event).await.unwrap();
    }

    #[tokio::test]
    async fn delete_issues_one_delete_call_and_returns_nothing() {
        let mut mock = MockControlPlane::new();
        mock.expect_delete_endpoint()
            .times(1)
            .withf(|req| req.endpoint_identifier == "analytics")
            .returning(|_| Ok(record("deleting")));

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Delete(descriptor(EndpointType::Any, MemberSelection::all()));

        assert_eq!(dispatcher.dispatch(&event).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_of_missing_endpoint_propagates_not_found() {
        let mut mock = MockControlPlane::new();
        mock.expect_delete_endpoint().times(1).returning(|req| {
            Err(Error::control_plane(
                "DeleteDBClusterEndpoint",
                req.endpoint_identifier.clone(),
                Some(dbendpoint_common::ENDPOINT_NOT_FOUND_CODE.to_string()),
                "endpoint analytics not found",
            ))
        });

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Delete(descriptor(EndpointType::Any, MemberSelection::all()));

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn transient_failure_is_not_retried() {
        let mut mock = MockControlPlane::new();
        mock.expect_create_endpoint().times(1).returning(|req| {
            Err(Error::control_plane_transient(
                "CreateDBClusterEndpoint",
                req.endpoint_identifier.clone(),
                None,
                "timed out",
            ))
        });

        let dispatcher = EventDispatcher::new(Arc::new(mock));
        let event = LifecycleEvent::Create(descriptor(EndpointType::Any, MemberSelection::all()));

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
