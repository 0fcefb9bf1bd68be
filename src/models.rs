//! Wire types for the relay endpoint and the upstream chat completions API
//!
//! Relay contract (`POST /roast`):
//! - request: `{"message": string, "systemPrompt": string}`
//! - success: `{"result": string}` with 200
//! - failure: `{"error": string}` with 400 or 500
use crate::errors::RelayError;
use serde::{Deserialize, Serialize};

/// The body posted to the relay. Both fields are optional at the serde level so that missing
/// keys, `null`s and empty strings all end up in the same 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl RelayRequest {
    pub fn new(message: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            system_prompt: Some(system_prompt.into()),
        }
    }
}

/// A relay request that has passed validation: both fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub user_message: String,
    pub system_prompt: String,
}

impl CompletionRequest {
    /// Parses and validates a raw request body. Anything that is not a JSON object with two
    /// non-empty string fields is an `InvalidRequest`.
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        let request: RelayRequest =
            serde_json::from_slice(body).map_err(|_| RelayError::InvalidRequest)?;
        Self::try_from(request)
    }
}

impl TryFrom<RelayRequest> for CompletionRequest {
    type Error = RelayError;

    fn try_from(request: RelayRequest) -> Result<Self, Self::Error> {
        match (request.message, request.system_prompt) {
            (Some(user_message), Some(system_prompt))
                if !user_message.is_empty() && !system_prompt.is_empty() =>
            {
                Ok(Self {
                    user_message,
                    system_prompt,
                })
            }
            _ => Err(RelayError::InvalidRequest),
        }
    }
}

/// The relay's success body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayResponse {
    pub result: String,
}

/// The relay's failure body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Request body for the upstream `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest<'a> {
    pub model: &'a str,
    pub messages: [UpstreamMessage<'a>; 2],
    pub max_tokens: u32,
}

impl<'a> UpstreamRequest<'a> {
    /// The system prompt always comes first, followed by the user's message.
    pub fn new(model: &'a str, max_tokens: u32, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            messages: [
                UpstreamMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                UpstreamMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// The parts of an upstream completion we care about. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamChoice {
    pub message: UpstreamChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl UpstreamResponse {
    /// The first choice's content, if there is one.
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}
