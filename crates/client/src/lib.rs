//! Resilient HTTP client core for the StrideLog fitness API
//!
//! Everything the browser-facing application sends to the backend goes
//! through this crate: timeouts, exponential-backoff retries, bearer token
//! attachment, and coordinated access-token refresh for any number of
//! concurrent requests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    ApiClient     │  execute + get/post/put/delete
//! └────────┬─────────┘
//!          │
//!          ├──► TokenRefreshCoordinator  (single-flight refresh)
//!          │         │
//!          ├─────────┴──► TokenStore     (memory / file persistence)
//!          │
//!          └──► AuthEventBus             (session lifecycle notifications)
//! ```
//!
//! A request is sent, its outcome classified, and the result either
//! returned, retried with backoff, or routed through a single token refresh
//! before one final retry. Every failure surfaces as exactly one
//! [`ApiError`].
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stridelog_client::{ApiClient, ClientConfig, MemoryTokenStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         base_url: "https://api.stridelog.app/api".to_string(),
//!         ..Default::default()
//!     };
//!     let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))?;
//!
//!     let runs: stridelog_client::ResponseEnvelope<serde_json::Value> =
//!         client.get("/runs").await?;
//!     println!("fetched {} runs", runs.data.as_array().map_or(0, Vec::len));
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod events;
pub mod executor;
pub mod refresh;
pub mod request;
pub mod response;
pub mod store;

pub use config::ClientConfig;
pub use events::{AuthEvent, AuthEventBus};
pub use executor::{ApiClient, ApiClientBuilder};
pub use refresh::TokenRefreshCoordinator;
pub use request::{ApiRequest, ApiRequestBuilder, RequestBody};
pub use response::ResponseEnvelope;
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use stridelog_domain::{ApiError, TokenPair};
