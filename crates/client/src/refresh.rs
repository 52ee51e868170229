//! Single-flight token refresh
//!
//! Any number of requests can hit a 401 on the same expired token at the
//! same time. The coordinator guarantees that exactly one refresh call goes
//! out: the first caller to find the in-flight slot empty populates it with
//! a shared future, every concurrent caller awaits that same future, and the
//! slot is cleared once the outcome settles.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use stridelog_domain::{extract_server_message, RefreshRequest, RefreshResponse, TokenPair};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::events::{AuthEvent, AuthEventBus};
use crate::store::TokenStore;

type SharedOutcome = Shared<BoxFuture<'static, bool>>;

/// Coordinates token refresh across concurrent requests.
///
/// `refresh()` returns `true` when the stored pair was renewed and is
/// usable, `false` when renewal failed and the session is over. On failure
/// the store is cleared and a single [`AuthEvent::AuthenticationFailed`] is
/// published for the whole coalesced group of callers.
#[derive(Clone)]
pub struct TokenRefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    refresh_url: String,
    timeout: Duration,
    store: Arc<dyn TokenStore>,
    events: AuthEventBus,
    in_flight: Mutex<Option<SharedOutcome>>,
}

impl TokenRefreshCoordinator {
    /// Create a coordinator targeting the given refresh endpoint.
    pub fn new(
        http: reqwest::Client,
        refresh_url: String,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
        events: AuthEventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                refresh_url,
                timeout,
                store,
                events,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Renew the stored token pair, coalescing concurrent callers onto one
    /// network call.
    pub async fn refresh(&self) -> bool {
        let outcome = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let pending = async move { Inner::perform(inner).await }.boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let renewed = outcome.clone().await;

        // Clear the slot unless a newer refresh already replaced it.
        let mut slot = self.inner.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&outcome)) {
            *slot = None;
        }

        renewed
    }
}

impl Inner {
    async fn perform(inner: Arc<Self>) -> bool {
        let refresh_token = match inner.store.get().await {
            Some(pair) => pair.refresh_token,
            None => {
                warn!("token refresh requested without a stored refresh token");
                inner.fail(401, "No refresh token available").await;
                return false;
            }
        };

        let response = inner
            .http
            .post(&inner.refresh_url)
            .timeout(inner.timeout)
            .json(&RefreshRequest { refresh_token: &refresh_token })
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh request did not reach the server");
                inner.fail(0, "Token refresh failed").await;
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_server_message(&body)
                .unwrap_or_else(|| "Token refresh rejected".to_string());
            warn!(status = status.as_u16(), "token refresh rejected by the server");
            inner.fail(status.as_u16(), &message).await;
            return false;
        }

        let parsed: RefreshResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "token refresh returned an unparseable body");
                inner.fail(0, "Token refresh returned an invalid response").await;
                return false;
            }
        };

        let pair = TokenPair::from(parsed);
        let access_token = pair.access_token.clone();
        if let Err(err) = inner.store.set(pair).await {
            warn!(error = %err, "failed to persist refreshed tokens");
            inner.fail(0, "Refreshed tokens could not be persisted").await;
            return false;
        }

        info!("access token refreshed");
        inner.events.publish(AuthEvent::TokenRefreshed { access_token });
        true
    }

    async fn fail(&self, status: u16, message: &str) {
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear tokens after refresh failure");
        }
        self.events.publish(AuthEvent::AuthenticationFailed {
            status,
            message: message.to_string(),
            url: self.refresh_url.clone(),
        });
    }
}
