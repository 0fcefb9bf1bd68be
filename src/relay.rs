//! The relay's core: turn a validated request into exactly one upstream chat completion call
//! and extract the generated text.
//!
//! All upstream settings, including the credential, live in [`RelaySettings`], which is built
//! once at startup and shared read-only through [`crate::AppState`].
use crate::client::HttpClient;
use crate::credential::ApiKey;
use crate::errors::UpstreamError;
use crate::models::{CompletionRequest, UpstreamRequest, UpstreamResponse};
use axum::body::Body;
use axum::http::{Method, Request, Uri, header};
use bon::Builder;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const COMPLETIONS_PATH: &str = "chat/completions";

/// Upstream responses larger than this are treated as malformed.
const MAX_UPSTREAM_BODY: usize = 4 * 1024 * 1024;

/// Everything the relay needs to talk to the upstream completions API.
#[derive(Debug, Clone, Builder)]
pub struct RelaySettings {
    #[builder(into)]
    pub api_key: ApiKey,
    /// Base URL of the OpenAI-compatible API; `chat/completions` is appended to it.
    #[builder(default = default_upstream_url())]
    pub upstream_url: Url,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    /// Bound on the whole upstream exchange, headers and body included.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

fn default_upstream_url() -> Url {
    Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream URL is valid")
}

impl RelaySettings {
    /// The full completions endpoint. A base without a trailing slash is treated as a
    /// directory, so `https://host/v1` and `https://host/v1/` both resolve to
    /// `https://host/v1/chat/completions`.
    pub fn completions_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.upstream_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(COMPLETIONS_PATH)
    }
}

/// Sends `request` upstream and returns the first choice's text, unmodified.
///
/// Exactly one outbound call is made; nothing is retried. The settings' timeout covers the
/// full exchange and on expiry the in-flight call is dropped.
#[instrument(skip_all, fields(model = %settings.model))]
pub async fn forward<T: HttpClient + Sync>(
    client: &T,
    settings: &RelaySettings,
    request: &CompletionRequest,
) -> Result<String, UpstreamError> {
    let upstream_request = build_upstream_request(settings, request)?;

    let exchange = async {
        let response = client
            .request(upstream_request)
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), MAX_UPSTREAM_BODY)
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok::<_, UpstreamError>((status, body))
    };

    let (status, body) = tokio::time::timeout(settings.timeout, exchange)
        .await
        .map_err(|_| UpstreamError::Timeout(settings.timeout))??;

    debug!(%status, body_len = body.len(), "Upstream responded");

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let completion: UpstreamResponse =
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    completion
        .into_text()
        .ok_or_else(|| UpstreamError::Malformed("no message content in first choice".into()))
}

fn build_upstream_request(
    settings: &RelaySettings,
    request: &CompletionRequest,
) -> Result<Request<Body>, UpstreamError> {
    if settings.api_key.is_empty() {
        return Err(UpstreamError::Request("API key is empty".into()));
    }

    let url = settings
        .completions_url()
        .map_err(|e| UpstreamError::Request(format!("invalid upstream URL: {e}")))?;
    let uri = Uri::try_from(url.as_str())
        .map_err(|e| UpstreamError::Request(format!("invalid upstream URI {url}: {e}")))?;

    let payload = UpstreamRequest::new(&settings.model, settings.max_tokens, request);
    let body = serde_json::to_vec(&payload).map_err(|e| UpstreamError::Request(e.to_string()))?;

    let authorization = settings
        .api_key
        .bearer_header()
        .map_err(|_| UpstreamError::Request("API key is not a valid header value".into()))?;

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, authorization);

    // Some fronting proxies reject requests whose host doesn't match the target.
    if let Some(host) = uri.host() {
        let host_value = match uri.port_u16() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        builder = builder.header(header::HOST, host_value);
    }

    builder
        .body(Body::from(body))
        .map_err(|e| UpstreamError::Request(e.to_string()))
}
