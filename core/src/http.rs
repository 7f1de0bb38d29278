//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and parses `TransportResult` values
//! without touching the network; whoever executes the request (the async
//! service, or a host across the FFI boundary) reports back what happened.
//!
//! `TransportResult` mirrors what a platform HTTP stack hands back: an
//! optional network error next to an optional response. The decoder looks
//! at the error first, so a failed exchange never reaches JSON parsing even
//! when some bytes arrived.

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

/// Query parameters whose values are masked by `HttpRequest::redacted_url`.
const SECRET_PARAMS: &[&str] = &["api_key", "session_id"];

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request URL with credential query values replaced by `***`.
    pub fn redacted_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| {
                let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                    "***".to_string()
                } else {
                    v.into_owned()
                };
                (k.into_owned(), v)
            })
            .collect();
        if pairs.is_empty() {
            return url.into();
        }
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.into()
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Outcome of executing an `HttpRequest`, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResult {
    pub error: Option<String>,
    pub response: Option<HttpResponse>,
}

impl TransportResult {
    pub fn completed(response: HttpResponse) -> Self {
        Self {
            error: None,
            response: Some(response),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            response: None,
        }
    }

    /// Attach whatever partial response the transport saw before failing.
    pub fn with_response(mut self, response: HttpResponse) -> Self {
        self.response = Some(response);
        self
    }
}

/// Method plus a path template such as `/account/{account_id}/favorite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: &'static str,
}

/// Compose an absolute request from a base URL and an endpoint template.
///
/// `{name}` segments in the template are replaced from `path_params` and
/// percent-encoded as path segments; query parameters are emitted in key
/// order so identical inputs always yield identical URLs.
pub fn build_request(
    base_url: &str,
    endpoint: Endpoint,
    path_params: &[(&str, &str)],
    query: &BTreeMap<&str, String>,
    headers: Vec<(String, String)>,
    body: Option<String>,
) -> Result<HttpRequest, ApiError> {
    let mut url = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| ApiError::MalformedUrl(format!("{base_url}: {e}")))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ApiError::MalformedUrl(format!("{base_url}: cannot be a base")))?;
        segments.pop_if_empty();
        for segment in endpoint.path.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = path_params
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            ApiError::MalformedUrl(format!("no value for path parameter `{name}`"))
                        })?;
                    if value.is_empty() {
                        return Err(ApiError::MalformedUrl(format!(
                            "empty value for path parameter `{name}`"
                        )));
                    }
                    segments.push(value);
                }
                None => {
                    segments.push(segment);
                }
            }
        }
    }

    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }

    Ok(HttpRequest {
        method: endpoint.method,
        url: url.into(),
        headers,
        body,
        timeout: None,
    })
}
