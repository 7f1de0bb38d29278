//! Response decoder shared by every API call.
//!
//! Checks run in a fixed order and short-circuit: transport failure, HTTP
//! status, empty body, JSON syntax, then the remote API's own error
//! envelope. Nothing is retained between calls.

use serde_json::Value;

use crate::error::{snippet, ApiError};
use crate::http::TransportResult;

/// How a `status_code` field in the payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodePolicy {
    /// Any numeric `status_code` is the remote error envelope.
    Reject,
    /// `status_code` is an acknowledgement; only `"success": false` is an error.
    Acknowledge,
}

/// Check transport outcome, status range and body presence, returning the body.
pub fn expect_body(result: TransportResult) -> Result<Vec<u8>, ApiError> {
    if let Some(message) = result.error {
        return Err(ApiError::TransportError(message));
    }
    let response = result
        .response
        .ok_or_else(|| ApiError::TransportError("no response was received".to_string()))?;
    if !(200..=299).contains(&response.status) {
        return Err(ApiError::HttpStatusError {
            status: response.status,
            body: snippet(&response.body),
        });
    }
    if response.body.is_empty() {
        return Err(ApiError::EmptyBodyError);
    }
    Ok(response.body)
}

/// Decode a JSON payload from a transport outcome.
pub fn decode(result: TransportResult, policy: StatusCodePolicy) -> Result<Value, ApiError> {
    let body = expect_body(result)?;
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::MalformedJsonError(format!("{e}; body: {}", snippet(&body)))
    })?;

    if let Some(code) = value.get("status_code").and_then(Value::as_i64) {
        let failed = match policy {
            StatusCodePolicy::Reject => true,
            StatusCodePolicy::Acknowledge => {
                value.get("success").and_then(Value::as_bool) == Some(false)
            }
        };
        if failed {
            let message = value
                .get("status_message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ApiError::RemoteApiError { code, message });
        }
    }

    Ok(value)
}
