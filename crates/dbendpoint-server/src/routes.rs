//! Provider callback routes
//!
//! - `POST /on-event` → [`on_event`]
//! - `POST /is-complete` → [`is_complete`]
//! - `GET /healthz` → `ok`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use dbendpoint_common::Error;
use dbendpoint_lifecycle::{
    is_complete, on_event, CompletionPoller, ControlPlane, EventDispatcher, IsCompleteResponse,
    OnEventResponse, ProviderEvent,
};

use crate::error::ApiError;

/// Shared state for the callback handlers
#[derive(Clone)]
pub struct AppState {
    /// Handles `on-event`
    pub dispatcher: EventDispatcher,
    /// Handles `is-complete`
    pub poller: CompletionPoller,
}

impl AppState {
    /// Build both components over one control plane
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            dispatcher: EventDispatcher::new(control_plane.clone()),
            poller: CompletionPoller::new(control_plane),
        }
    }
}

/// Build the router with shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/on-event", post(on_event_handler))
        .route("/is-complete", post(is_complete_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

fn parse_event(body: &[u8]) -> Result<ProviderEvent, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::from(Error::serialization(format!("invalid event body: {}", e))))
}

async fn on_event_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<OnEventResponse>, ApiError> {
    let event = parse_event(&body)?;
    let response = on_event(&state.dispatcher, &event).await?;
    info!(
        request_type = %event.request_type,
        physical_id = %response.physical_resource_id,
        "on-event handled"
    );
    Ok(Json(response))
}

async fn is_complete_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IsCompleteResponse>, ApiError> {
    let event = parse_event(&body)?;
    let response = is_complete(&state.poller, &event).await?;
    Ok(Json(response))
}
