//! End-to-end tests: client adapter -> relay router -> mocked upstream
//!
//! The adapter's HTTP client dispatches straight into the relay router, so these tests cover
//! the full wire contract between the two without opening sockets.

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use roastbot::adapter::{FALLBACK_REPLY, RelayClient};
use roastbot::chat::ChatSession;
use roastbot::client::HttpClient;
use roastbot::errors::{AdapterError, GENERATION_FAILED_MESSAGE, MISSING_FIELDS_MESSAGE};
use roastbot::mode::Mode;
use roastbot::relay::RelaySettings;
use roastbot::test_utils::MockHttpClient;
use roastbot::{AppState, build_router};
use serde_json::json;
use std::time::Duration;
use tower::util::ServiceExt; // for oneshot()

const TEST_KEY: &str = "sk-roundtrip-secret";

/// An [`HttpClient`] that answers every request with the given router.
#[derive(Clone)]
struct RouterClient {
    router: Router,
}

impl std::fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClient for RouterClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.router.clone().oneshot(req).await?)
    }
}

fn relay_with_upstream(upstream: &MockHttpClient, timeout: Duration) -> RelayClient<RouterClient> {
    let settings = RelaySettings::builder()
        .api_key(TEST_KEY)
        .upstream_url("https://api.example.com/v1/".parse().unwrap())
        .timeout(timeout)
        .build();
    let router = build_router(AppState::with_client(settings, upstream.clone()));
    RelayClient::with_client(
        "http://relay.test/roast".parse().unwrap(),
        RouterClient { router },
    )
}

fn completion(content: &str) -> MockHttpClient {
    MockHttpClient::new(
        StatusCode::OK,
        &json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string(),
    )
}

#[tokio::test]
async fn test_hello_round_trip() {
    let upstream = completion("Hi there!");
    let client = relay_with_upstream(&upstream, Duration::from_secs(30));

    let text = client.complete("Hello", "Be polite.").await.unwrap();
    assert_eq!(text, "Hi there!");

    let requests = upstream.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri, "https://api.example.com/v1/chat/completions");
    assert_eq!(
        requests[0].json()["messages"],
        json!([
            {"role": "system", "content": "Be polite."},
            {"role": "user", "content": "Hello"}
        ])
    );
    assert_eq!(
        requests[0].header("authorization"),
        Some(format!("Bearer {TEST_KEY}").as_str())
    );
}

#[tokio::test]
async fn test_empty_message_is_rejected_before_upstream() {
    let upstream = completion("unused");
    let client = relay_with_upstream(&upstream, Duration::from_secs(30));

    let err = client.complete("", "Be polite.").await.unwrap_err();
    match err {
        AdapterError::Status { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message.as_deref(), Some(MISSING_FIELDS_MESSAGE));
        }
        other => panic!("expected 400 from relay, got {other:?}"),
    }
    assert!(upstream.get_requests().is_empty());

    assert_eq!(
        client.complete_or_fallback("", "Be polite.").await,
        FALLBACK_REPLY
    );
}

#[tokio::test]
async fn test_upstream_failure_reaches_adapter_as_generic_error() {
    let upstream = MockHttpClient::new(
        StatusCode::SERVICE_UNAVAILABLE,
        &format!("upstream overloaded, key={TEST_KEY}"),
    );
    let client = relay_with_upstream(&upstream, Duration::from_secs(30));

    let err = client.complete("Hello", "Be polite.").await.unwrap_err();
    match err {
        AdapterError::Status { status, message } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message.as_deref(), Some(GENERATION_FAILED_MESSAGE));
        }
        other => panic!("expected 500 from relay, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upstream_timeout_falls_back() {
    let upstream = completion("too late").with_delay(Duration::from_secs(5));
    let client = relay_with_upstream(&upstream, Duration::from_millis(25));

    assert_eq!(
        client.complete_or_fallback("Hello", "Be polite.").await,
        FALLBACK_REPLY
    );
    assert_eq!(upstream.get_requests().len(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let upstream = completion("same answer");
    let client = relay_with_upstream(&upstream, Duration::from_secs(30));

    let (a, b, c) = tokio::join!(
        client.complete("one", "Be polite."),
        client.complete("two", "Be polite."),
        client.complete("three", "Be rude."),
    );
    assert_eq!(a.unwrap(), "same answer");
    assert_eq!(b.unwrap(), "same answer");
    assert_eq!(c.unwrap(), "same answer");

    let mut users: Vec<String> = upstream
        .get_requests()
        .iter()
        .map(|r| r.json()["messages"][1]["content"].as_str().unwrap().to_string())
        .collect();
    users.sort();
    assert_eq!(users, vec!["one", "three", "two"]);
}

#[tokio::test]
async fn test_chat_session_over_relay() {
    let upstream = completion("Nice try.");
    let client = relay_with_upstream(&upstream, Duration::from_secs(30));
    let mut session = ChatSession::new(client, Mode::Roast);

    let reply = session.send("Roast my code").await.unwrap();
    assert_eq!(reply.text, "Nice try.");

    let forwarded = upstream.get_requests()[0].json();
    assert_eq!(forwarded["messages"][0]["content"], Mode::Roast.system_prompt());
    assert_eq!(session.render_transcript(), "you> Roast my code\nbot> Nice try.");
}
