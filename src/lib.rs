//! roastbot - a single-endpoint chat completion relay
//!
//! The relay accepts `{"message", "systemPrompt"}` on `POST /roast`, attaches the upstream
//! credential, makes one call to an OpenAI-compatible `chat/completions` endpoint and answers
//! with `{"result"}`. The [`adapter`] module is the matching client, and [`chat`] builds a
//! terminal chat session on top of it.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument};

pub mod adapter;
pub mod chat;
pub mod client;
pub mod credential;
pub mod errors;
pub mod handlers;
pub mod mode;
pub mod models;
pub mod relay;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use client::{HttpClient, HyperClient, PoolConfig};
use relay::RelaySettings;

/// The path the relay listens on.
pub const RELAY_PATH: &str = "/roast";

/// The application state: the outbound HTTP client and the read-only relay settings
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub settings: Arc<RelaySettings>,
}

impl AppState<HyperClient> {
    /// Create a new AppState with a pooled Hyper client
    pub fn new(settings: RelaySettings, pool: PoolConfig) -> Self {
        Self::with_client(settings, client::create_hyper_client(pool))
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(settings: RelaySettings, http_client: T) -> Self {
        Self {
            http_client,
            settings: Arc::new(settings),
        }
    }
}

/// Build the main router for the relay
/// This creates routes for:
/// - `POST /roast` - Relays a message and system prompt to the completions API
/// - `GET /health` - Liveness check, never touches upstream
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route(RELAY_PATH, post(handlers::complete::<T>))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Builds the CORS layer for browser front-ends. An empty origin list allows any origin.
pub fn build_cors_layer(
    allowed_origins: &[String],
) -> Result<CorsLayer, header::InvalidHeaderValue> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(origins))
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection, with every metric name
/// starting with `prefix`.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
