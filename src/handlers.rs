/// Axum handlers for the relay server
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::{CompletionRequest, RelayResponse};
use crate::{AppState, relay};
use axum::{Json, body::Bytes, extract::State};
use tracing::{debug, info, instrument};

/// Validates the body, forwards it upstream once, and answers with the generated text.
///
/// The body is read as raw bytes and parsed regardless of `Content-Type`, so a body that is
/// missing, not JSON, or lacks either field gets the same 400 and never reaches upstream.
#[instrument(skip(state, body))]
pub async fn complete<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    body: Bytes,
) -> Result<Json<RelayResponse>, RelayError> {
    debug!("Received relay request body of size: {}", body.len());
    let request = CompletionRequest::from_body(&body)?;

    info!(
        message_len = request.user_message.len(),
        system_prompt_len = request.system_prompt.len(),
        "Forwarding completion request"
    );

    let result = relay::forward(&state.http_client, &state.settings, &request).await?;
    Ok(Json(RelayResponse { result }))
}

pub async fn health() -> &'static str {
    "ok"
}
