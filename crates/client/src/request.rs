//! Request descriptors
//!
//! An [`ApiRequest`] is the immutable description of a single API call:
//! target, payload, timeout, retry budget, and the two independent auth
//! flags. Construct one through [`ApiRequestBuilder`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use stridelog_domain::{ApiError, Result};

/// Payload attached to an outbound request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No payload
    Empty,
    /// Structured value, serialized as JSON with a matching content type
    Json(serde_json::Value),
    /// Opaque bytes, passed through unmodified with no content-type override
    Raw(Vec<u8>),
}

/// Immutable description of a single API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) url: String,
    pub(crate) method: Method,
    pub(crate) headers: HeaderMap,
    pub(crate) body: RequestBody,
    pub(crate) timeout: Duration,
    pub(crate) retries: u32,
    pub(crate) retry_delay: Duration,
    pub(crate) requires_auth: bool,
    pub(crate) skip_auth: bool,
}

impl ApiRequest {
    /// Start building a request.
    pub fn builder(method: Method, url: impl Into<String>) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, url)
    }

    /// Target URL of this request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method of this request.
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Builder for [`ApiRequest`].
///
/// Construction failures (invalid header, unserializable body) are deferred
/// to [`ApiRequestBuilder::build`] so the chain stays fluent.
#[derive(Debug)]
pub struct ApiRequestBuilder {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
    requires_auth: bool,
    skip_auth: bool,
    invalid: Option<String>,
}

impl ApiRequestBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: Duration::from_secs(10),
            retries: 3,
            retry_delay: Duration::from_secs(1),
            requires_auth: true,
            skip_auth: false,
            invalid: None,
        }
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a structured body, serialized as JSON.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = RequestBody::Json(value),
            Err(err) => {
                self.invalid
                    .get_or_insert(format!("failed to serialize request body: {err}"));
            }
        }
        self
    }

    /// Attach an opaque byte payload. No content-type header is set.
    pub fn raw(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Raw(body);
        self
    }

    /// Override the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the maximum retries after the initial attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Override the base backoff delay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fail fast when no access token is available.
    pub fn requires_auth(mut self, required: bool) -> Self {
        self.requires_auth = required;
        self
    }

    /// Never attach a bearer token, even when one is stored.
    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }

    /// Finalize the descriptor.
    pub fn build(self) -> Result<ApiRequest> {
        if let Some(reason) = self.invalid {
            return Err(ApiError::transport(reason));
        }
        if self.url.is_empty() {
            return Err(ApiError::transport("request URL is empty"));
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::transport(format!("invalid header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|err| ApiError::transport(format!("invalid header value: {err}")))?;
            headers.insert(name, value);
        }

        Ok(ApiRequest {
            url: self.url,
            method: self.method,
            headers,
            body: self.body,
            timeout: self.timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
            requires_auth: self.requires_auth,
            skip_auth: self.skip_auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let request = ApiRequest::builder(Method::GET, "http://localhost/api/runs")
            .build()
            .expect("build");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.timeout, Duration::from_secs(10));
        assert_eq!(request.retries, 3);
        assert_eq!(request.retry_delay, Duration::from_secs(1));
        assert!(request.requires_auth);
        assert!(!request.skip_auth);
        assert!(matches!(request.body, RequestBody::Empty));
    }

    #[test]
    fn builder_applies_overrides() {
        let request = ApiRequest::builder(Method::POST, "http://localhost/api/runs")
            .header("X-Request-Id", "abc123")
            .json(&serde_json::json!({ "distance_km": 5.2 }))
            .timeout(Duration::from_millis(500))
            .retries(1)
            .retry_delay(Duration::from_millis(50))
            .requires_auth(false)
            .skip_auth(true)
            .build()
            .expect("build");

        assert_eq!(request.headers.get("X-Request-Id").unwrap(), "abc123");
        assert!(matches!(request.body, RequestBody::Json(_)));
        assert_eq!(request.retries, 1);
        assert!(!request.requires_auth);
        assert!(request.skip_auth);
    }

    #[test]
    fn raw_body_passes_through() {
        let request = ApiRequest::builder(Method::POST, "http://localhost/api/upload")
            .raw(vec![0x47, 0x50, 0x58])
            .build()
            .expect("build");

        match request.body {
            RequestBody::Raw(bytes) => assert_eq!(bytes, vec![0x47, 0x50, 0x58]),
            other => panic!("expected raw body, got {other:?}"),
        }
    }

    #[test]
    fn invalid_header_fails_at_build() {
        let result = ApiRequest::builder(Method::GET, "http://localhost/api/runs")
            .header("bad header name", "value")
            .build();

        let err = result.expect_err("build should fail");
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn empty_url_fails_at_build() {
        let result = ApiRequest::builder(Method::GET, "").build();
        assert!(result.is_err());
    }
}
