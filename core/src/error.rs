//! Error types for the favorites client.
//!
//! # Design
//! Each variant is scoped to a single request/response cycle. None of them
//! are fatal, and none carry enough state to corrupt what the caller has
//! already rendered. `HttpStatusError` keeps a truncated body snippet so the
//! failure can be diagnosed from a log line alone.

use thiserror::Error;

/// Longest body excerpt kept inside an error, in bytes.
pub const SNIPPET_LEN: usize = 256;

/// Errors returned by `FavoritesClient` build and parse methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The transport layer reported a network-level failure.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The server answered with a status outside 200..=299.
    #[error("HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    /// The server answered 2xx with no body.
    #[error("response body was empty")]
    EmptyBodyError,

    /// The body was not valid JSON, or not the JSON shape expected.
    #[error("malformed JSON: {0}")]
    MalformedJsonError(String),

    /// The payload carried the remote API's own error envelope.
    #[error("remote API error {code}: {message}")]
    RemoteApiError { code: i64, message: String },

    /// The favorites list payload had no `results` field.
    #[error("response has no `results` field")]
    MissingResultsField,

    /// The favorite mutation payload had no `status_code` field.
    #[error("response has no `status_code` field")]
    MissingStatusCodeField,

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The base URL or the composed request URL is not a valid URI.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatusError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while loading a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Cut `body` down to at most `SNIPPET_LEN` bytes on a char boundary.
pub(crate) fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_LEN {
        return text.into_owned();
    }
    let mut end = SNIPPET_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_keeps_short_bodies_intact() {
        assert_eq!(snippet(b"oops"), "oops");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "é".repeat(SNIPPET_LEN);
        let cut = snippet(body.as_bytes());
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= SNIPPET_LEN + 3);
    }

    #[test]
    fn http_status_is_exposed_only_for_status_errors() {
        let err = ApiError::HttpStatusError {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.http_status(), Some(500));
        assert_eq!(ApiError::EmptyBodyError.http_status(), None);
    }
}
