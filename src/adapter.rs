//! Client adapter for the relay endpoint
//!
//! [`RelayClient::complete`] returns a typed result so callers can tell a failure apart from a
//! legitimate reply; [`RelayClient::complete_or_fallback`] collapses every failure into
//! [`FALLBACK_REPLY`] for presentation code that just wants something to show.
use crate::client::{HttpClient, HyperClient, PoolConfig, create_hyper_client};
use crate::errors::AdapterError;
use crate::models::{ErrorResponse, RelayRequest, RelayResponse};
use axum::body::Body;
use axum::http::{Method, Request, Uri, header};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Where a relay runs during local development.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:5001/roast";

/// Shown in place of a reply whenever the relay call fails.
pub const FALLBACK_REPLY: &str = "Oops! Something went wrong…";

/// Slightly longer than the relay's own upstream timeout, so the relay gets to answer first.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(35);

const MAX_RELAY_BODY: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RelayClient<T: HttpClient> {
    http_client: T,
    relay_url: Url,
    timeout: Duration,
}

impl RelayClient<HyperClient> {
    /// A client using a pooled hyper client.
    pub fn new(relay_url: Url) -> Self {
        Self::with_client(relay_url, create_hyper_client(PoolConfig::default()))
    }
}

impl<T: HttpClient + Sync> RelayClient<T> {
    /// Create a client with a custom HTTP client (useful for testing)
    pub fn with_client(relay_url: Url, http_client: T) -> Self {
        Self {
            http_client,
            relay_url,
            timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends one request to the relay and returns its `result` field.
    #[instrument(skip_all, fields(relay = %self.relay_url))]
    pub async fn complete(
        &self,
        message: &str,
        system_prompt: &str,
    ) -> Result<String, AdapterError> {
        let request = self.build_request(message, system_prompt)?;

        let exchange = async {
            let response = self
                .http_client
                .request(request)
                .await
                .map_err(|e| AdapterError::Transport(e.to_string()))?;
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), MAX_RELAY_BODY)
                .await
                .map_err(|e| AdapterError::Transport(e.to_string()))?;
            Ok::<_, AdapterError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| AdapterError::Timeout(self.timeout))??;

        debug!(%status, body_len = body.len(), "Relay responded");

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .map(|e| e.error);
            return Err(AdapterError::Status { status, message });
        }

        serde_json::from_slice::<RelayResponse>(&body)
            .map(|response| response.result)
            .map_err(|e| AdapterError::Malformed(e.to_string()))
    }

    /// Like [`complete`](Self::complete), but any failure becomes [`FALLBACK_REPLY`].
    pub async fn complete_or_fallback(&self, message: &str, system_prompt: &str) -> String {
        match self.complete(message, system_prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Relay call failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    fn build_request(
        &self,
        message: &str,
        system_prompt: &str,
    ) -> Result<Request<Body>, AdapterError> {
        let uri = Uri::try_from(self.relay_url.as_str())
            .map_err(|e| AdapterError::Request(format!("invalid relay URL: {e}")))?;
        let body = serde_json::to_vec(&RelayRequest::new(message, system_prompt))
            .map_err(|e| AdapterError::Request(e.to_string()))?;

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| AdapterError::Request(e.to_string()))
    }
}
