//! HTTP mapping for lifecycle errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use dbendpoint_common::Error;

/// Lifecycle error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    /// Status code for the wrapped error
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } | Error::Serialization { .. } => StatusCode::BAD_REQUEST,
            Error::ControlPlane { retryable: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::ControlPlane { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        warn!(status = status.as_u16(), error = %message, "request failed");

        let body = serde_json::json!({
            "error": message,
            "code": self.0.code(),
            "retryable": self.0.is_retryable(),
        });

        (status, Json(body)).into_response()
    }
}
