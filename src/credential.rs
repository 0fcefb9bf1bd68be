/// The upstream API credential
use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use std::fmt;

/// A wrapper around the upstream API key whose `Debug` output is redacted, so configuration
/// structs holding it can be logged as a whole.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The raw key. Only the outbound `Authorization` header should ever see this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Builds the `Authorization: Bearer ...` header value, marked sensitive so that hyper and
    /// tracing layers don't print it.
    pub fn bearer_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<empty>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}
