//! Completion poller
//!
//! Re-reads the endpoint from the control plane and classifies it:
//!
//! | observed status                         | result     |
//! |-----------------------------------------|------------|
//! | `available`, `inactive`                 | Complete   |
//! | `deleted`, or no matching record        | Complete   |
//! | `creating`, `modifying`, `deleting`     | Incomplete |
//! | anything else                           | Incomplete |
//!
//! Only reads are issued, so the poller can be called any number of times.
//! Scheduling and deadlines belong to the caller.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use dbendpoint_common::{EndpointStatus, LifecycleEvent, RequestType, Result};

use crate::control_plane::{ControlPlane, DescribeEndpointsRequest, EndpointRecord};

/// Classification of one poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Convergence {
    /// The endpoint reached a stable state (or is gone)
    Complete {
        /// Observed status
        status: EndpointStatus,
        /// The matching record, absent when the endpoint no longer exists
        record: Option<EndpointRecord>,
    },
    /// The endpoint is still transitioning; poll again
    Incomplete {
        /// Observed status
        status: EndpointStatus,
    },
}

impl Convergence {
    /// Classify an observed record (or its absence)
    pub fn classify(record: Option<EndpointRecord>) -> Self {
        let status = EndpointStatus::observed(record.as_ref().and_then(|r| r.status.as_deref()));
        if status.is_settled() {
            Convergence::Complete { status, record }
        } else {
            Convergence::Incomplete { status }
        }
    }

    /// Whether the operation has converged
    pub fn is_complete(&self) -> bool {
        matches!(self, Convergence::Complete { .. })
    }

    /// The observed status
    pub fn status(&self) -> &EndpointStatus {
        match self {
            Convergence::Complete { status, .. } | Convergence::Incomplete { status } => status,
        }
    }

    /// The matching record when complete and still present
    pub fn record(&self) -> Option<&EndpointRecord> {
        match self {
            Convergence::Complete { record, .. } => record.as_ref(),
            Convergence::Incomplete { .. } => None,
        }
    }
}

/// Reads endpoint status and decides whether an operation has converged
#[derive(Clone)]
pub struct CompletionPoller {
    control_plane: Arc<dyn ControlPlane>,
}

impl CompletionPoller {
    /// Create a poller over the given control plane
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self { control_plane }
    }

    /// Poll once
    ///
    /// Describe errors propagate; an unrecognized status is `Incomplete`,
    /// never an error.
    #[instrument(
        skip(self, event),
        fields(
            request_type = %event.request_type(),
            endpoint = %event.descriptor().endpoint_identifier,
            cluster = %event.descriptor().cluster_identifier,
        )
    )]
    pub async fn poll(&self, event: &LifecycleEvent) -> Result<Convergence> {
        let descriptor = event.descriptor();
        let identifier = descriptor.normalized_identifier();

        let records = self
            .control_plane
            .describe_endpoints(&DescribeEndpointsRequest::from(descriptor))
            .await
            .inspect_err(|e| warn!(error = %e, "failed to describe custom endpoint"))?;

        debug!(matches = records.len(), "described custom endpoints");

        let record = records
            .into_iter()
            .find(|r| r.endpoint_identifier == identifier);
        let convergence = Convergence::classify(record);

        match &convergence {
            Convergence::Complete { status, record } => {
                if record.is_none() && event.request_type() != RequestType::Delete {
                    warn!(
                        status = %status,
                        "custom endpoint disappeared before reaching a stable state"
                    );
                }
                info!(status = %status, "custom endpoint operation complete");
            }
            Convergence::Incomplete { status } => {
                if let EndpointStatus::Unknown(raw) = status {
                    warn!(status = %raw, "unrecognized endpoint status, continuing to poll");
                }
                info!(status = %status, "custom endpoint operation in progress");
            }
        }

        Ok(convergence)
    }
}
