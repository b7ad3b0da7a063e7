//! Lifecycle reconciliation for cluster custom endpoints
//!
//! Two stateless components driven by an external provider framework:
//! - [`EventDispatcher`]: one control-plane mutation per desired-state change
//! - [`CompletionPoller`]: classifies the observed status as complete or not
//!
//! Both talk to the owning service through the [`ControlPlane`] trait.

#![deny(missing_docs)]

pub mod control_plane;
pub mod dispatcher;
pub mod handler;
pub mod poller;

pub use control_plane::{
    ControlPlane, CreateEndpointRequest, DeleteEndpointRequest, DescribeEndpointsRequest,
    EndpointRecord, ModifyEndpointRequest,
};
pub use dispatcher::EventDispatcher;
pub use handler::{is_complete, on_event, IsCompleteResponse, OnEventResponse, ProviderEvent};
pub use poller::{CompletionPoller, Convergence};
