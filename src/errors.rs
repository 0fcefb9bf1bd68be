//! Error types for the relay and the client adapter
//!
//! Relay errors carry full upstream detail for server-side logging, but their HTTP rendering only
//! ever exposes one of two fixed messages.
use crate::models::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tracing::{error, warn};

/// Returned to callers whose payload lacks a usable `message` or `systemPrompt`.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing message or systemPrompt";

/// Returned to callers for every upstream failure, whatever the cause.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate response.";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    InvalidRequest,
    #[error("upstream completion failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            RelayError::InvalidRequest => {
                warn!("Rejected relay request with missing fields");
                MISSING_FIELDS_MESSAGE
            }
            RelayError::Upstream(e) => {
                error!(error = %e, "Upstream completion failed");
                GENERATION_FAILED_MESSAGE
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Everything that can go wrong between handing a validated request to the upstream API and
/// extracting its text.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to build upstream request: {0}")]
    Request(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

/// Failures seen by the client adapter when calling the relay.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("failed to build relay request: {0}")]
    Request(String),
    #[error("could not reach relay: {0}")]
    Transport(String),
    #[error("relay did not answer within {0:?}")]
    Timeout(Duration),
    #[error("relay returned {status}{}", status_detail(.message))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("malformed relay response: {0}")]
    Malformed(String),
}

fn status_detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}
