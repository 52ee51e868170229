//! Request execution with timeout, retry, and refresh-once semantics
//!
//! [`ApiClient`] is the entry point for every outbound call. Each `execute`
//! drives an explicit transition machine: a failed attempt is planned into
//! exactly one of retry-with-backoff, single-flight token refresh, terminal
//! auth failure, or plain failure. The planner is a pure function, so the
//! retry/refresh interaction is testable transition by transition.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stridelog_domain::{auth_failure_message, classify_status, ApiError, Result};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::events::{AuthEvent, AuthEventBus};
use crate::refresh::TokenRefreshCoordinator;
use crate::request::{ApiRequest, ApiRequestBuilder, RequestBody};
use crate::response::{decode_success, ResponseEnvelope};
use crate::store::TokenStore;

/// Next step chosen after a failed attempt.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    /// Wait out the backoff delay, then re-send
    Retry { delay: Duration },
    /// Run the single-flight token refresh, then re-send once
    RefreshAuth,
    /// End the session and fail without consulting the coordinator
    FailAuth,
    /// Surface the error as-is
    Fail,
}

/// Decide what a failed attempt leads to.
///
/// A 401 goes to the coordinator exactly once per call and never for auth
/// endpoints; transient statuses retry while budget remains; everything
/// else surfaces.
fn plan_transition(
    error: &ApiError,
    attempt: u32,
    max_retries: u32,
    base_delay: Duration,
    auth_retried: bool,
    on_auth_endpoint: bool,
) -> Transition {
    if error.status() == 401 {
        if auth_retried || on_auth_endpoint {
            return Transition::FailAuth;
        }
        return Transition::RefreshAuth;
    }

    if error.is_retryable() && attempt < max_retries {
        return Transition::Retry { delay: backoff_delay(base_delay, attempt) };
    }

    Transition::Fail
}

/// Exponential backoff: `base * 2^attempt`, capped to avoid shift overflow.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.min(10);
    base.saturating_mul(1u32 << shift)
}

/// Raw outcome of one network attempt, body already read.
struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

/// API client with timeout, retry, and coordinated token refresh.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    events: AuthEventBus,
    refresh: TokenRefreshCoordinator,
}

impl ApiClient {
    /// Create a client with the given configuration and token store.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        Self::builder().config(config).store(store).build()
    }

    /// Create a builder for fluent configuration.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// The auth event bus; subscribe here for session lifecycle events.
    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    /// The token store backing this client.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Start a request against the configured base URL, seeded with the
    /// configured timeout and retry defaults.
    pub fn request(&self, method: Method, api_path: &str) -> ApiRequestBuilder {
        ApiRequest::builder(method, self.config.url(api_path))
            .timeout(self.config.timeout)
            .retries(self.config.max_retries)
            .retry_delay(self.config.retry_delay)
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, api_path: &str) -> Result<ResponseEnvelope<T>> {
        self.execute(self.request(Method::GET, api_path).build()?).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        api_path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope<T>> {
        self.execute(self.request(Method::POST, api_path).json(body).build()?).await
    }

    /// Execute a PUT request with a JSON body.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        api_path: &str,
        body: &B,
    ) -> Result<ResponseEnvelope<T>> {
        self.execute(self.request(Method::PUT, api_path).json(body).build()?).await
    }

    /// Execute a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, api_path: &str) -> Result<ResponseEnvelope<T>> {
        self.execute(self.request(Method::DELETE, api_path).build()?).await
    }

    /// Execute a request to completion.
    ///
    /// Resolves with a decoded envelope or exactly one [`ApiError`]. See the
    /// module docs for the retry/refresh semantics.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<ResponseEnvelope<T>> {
        // Fail fast when the call needs a session and none exists.
        if request.requires_auth && !request.skip_auth && self.store.get().await.is_none() {
            return Err(ApiError::Auth {
                message: "Authentication required".to_string(),
                status: 401,
                body: None,
            });
        }

        let on_auth_endpoint = self.config.is_auth_endpoint(request.url());
        let mut attempt: u32 = 0;
        let mut auth_retried = false;

        loop {
            let error = match self.send_once(&request).await {
                Ok(raw) if (200..300).contains(&raw.status) => {
                    match decode_success(raw.status, raw.headers, raw.body) {
                        Ok(envelope) => {
                            debug!(status = envelope.status, "request succeeded");
                            return Ok(envelope);
                        }
                        // A malformed success body counts as a transport
                        // fault and goes through the same retry policy.
                        Err(err) => err,
                    }
                }
                Ok(raw) => classify_status(raw.status, &raw.body),
                Err(err) => err,
            };

            match plan_transition(
                &error,
                attempt,
                request.retries,
                request.retry_delay,
                auth_retried,
                on_auth_endpoint,
            ) {
                Transition::Retry { delay } => {
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Transition::RefreshAuth => {
                    debug!("received 401, attempting token refresh");
                    if self.refresh.refresh().await {
                        // Re-issue once with the renewed token; the retry
                        // counter is not consumed by the refresh round.
                        auth_retried = true;
                    } else {
                        return Err(ApiError::Auth {
                            message: auth_failure_message(Some(error.message())),
                            status: 401,
                            body: error.body().map(str::to_string),
                        });
                    }
                }
                Transition::FailAuth => {
                    if let Err(err) = self.store.clear().await {
                        warn!(error = %err, "failed to clear tokens after auth failure");
                    }
                    self.events.publish(AuthEvent::AuthenticationFailed {
                        status: error.status(),
                        message: error.message().to_string(),
                        url: request.url().to_string(),
                    });
                    return Err(error);
                }
                Transition::Fail => return Err(error),
            }
        }
    }

    /// Perform one attempt: attach the current token, send, and read the
    /// body, all raced against the request timeout.
    ///
    /// The token is re-read from the store on every attempt so a retried
    /// call never carries a stale credential after a refresh.
    async fn send_once(&self, request: &ApiRequest) -> Result<RawResponse> {
        let token = if request.skip_auth {
            None
        } else {
            self.store.get().await.map(|pair| pair.access_token)
        };

        let mut builder = self.http.request(request.method.clone(), &request.url);
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Raw(bytes) => builder.body(bytes.clone()),
        };
        if !request.headers.is_empty() {
            builder = builder.headers(request.headers.clone());
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::transport("stored access token is not a valid header value"))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        let exchange = async {
            let response = builder.send().await.map_err(map_transport_error)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(map_transport_error)?;
            Ok(RawResponse { status, headers, body })
        };

        match tokio::time::timeout(request.timeout, exchange).await {
            Ok(outcome) => outcome,
            // The loser of the race is dropped, not cancelled; its result
            // is simply never observed.
            Err(_) => {
                warn!(timeout_ms = request.timeout.as_millis() as u64, "request timed out");
                Err(ApiError::timeout())
            }
        }
    }
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout()
    } else {
        ApiError::transport(err)
    }
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<dyn TokenStore>>,
    events: Option<AuthEventBus>,
}

impl ApiClientBuilder {
    /// Set the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the token store.
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an existing event bus instead of creating a fresh one.
    pub fn event_bus(mut self, events: AuthEventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns error if no token store was provided or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        let store = self
            .store
            .ok_or_else(|| ApiError::transport("token store not set"))?;
        let events = self
            .events
            .unwrap_or_else(|| AuthEventBus::new(config.event_capacity));

        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|err| ApiError::transport(format!("failed to build HTTP client: {err}")))?;

        let refresh = TokenRefreshCoordinator::new(
            http.clone(),
            config.refresh_url(),
            config.timeout,
            Arc::clone(&store),
            events.clone(),
        );

        Ok(ApiClient { http, config, store, events, refresh })
    }
}
