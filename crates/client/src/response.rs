//! Response envelopes and body decoding

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use stridelog_domain::{ApiError, Result};

/// Decoded successful response.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    /// Decoded body
    pub data: T,
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
}

/// Decode a successful response body by its declared content type.
///
/// JSON payloads are parsed into `T`; a 204 decodes `T` from JSON null
/// (use `()` or an `Option` for such endpoints); any other content type is
/// surfaced as raw text. A body that cannot populate `T` is a status-0
/// failure, eligible for retry like any other transport fault.
pub(crate) fn decode_success<T: DeserializeOwned>(
    status: u16,
    headers: HeaderMap,
    body: String,
) -> Result<ResponseEnvelope<T>> {
    let data = if status == 204 {
        serde_json::from_value(serde_json::Value::Null)
            .map_err(|err| ApiError::transport(format!("empty response cannot populate the expected type: {err}")))?
    } else if is_json(&headers) {
        serde_json::from_str(&body)
            .map_err(|err| ApiError::transport(format!("invalid JSON response: {err}")))?
    } else {
        serde_json::from_value(serde_json::Value::String(body))
            .map_err(|err| ApiError::transport(format!("unexpected response body: {err}")))?
    };

    Ok(ResponseEnvelope { data, status, headers })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("application/json"))
}
