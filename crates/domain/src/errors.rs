//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP statuses treated as transient and eligible for retry.
///
/// Status 0 (transport failure, no HTTP response observed) is also retried,
/// but it is not an HTTP status and is handled separately by
/// [`ApiError::is_retryable`].
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Main error type for StrideLog API operations
///
/// Every failure path of the client produces exactly one `ApiError`. The
/// numeric status returned by [`ApiError::status`] preserves the HTTP status
/// where one was observed; status 0 is reserved for transport-level failures
/// (DNS, connection reset, malformed response) and is distinct from any HTTP
/// status.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiError {
    /// Transport-level failure before any HTTP status was observed
    #[error("{message}")]
    Transport { message: String },

    /// The client-side timeout fired before the exchange completed
    #[error("{message}")]
    Timeout { message: String },

    /// Authentication failure (HTTP 401)
    #[error("{message}")]
    Auth { message: String, status: u16, body: Option<String> },

    /// Any other non-success HTTP response
    #[error("{message}")]
    Http { message: String, status: u16, body: Option<String> },
}

impl ApiError {
    /// Create a transport error (status 0) from a failure detail.
    pub fn transport(detail: impl std::fmt::Display) -> Self {
        Self::Transport { message: format!("Network error: {detail}") }
    }

    /// Create the self-triggered timeout error (status 408).
    pub fn timeout() -> Self {
        Self::Timeout { message: "Request timeout".to_string() }
    }

    /// Numeric status for this error. 0 means no HTTP response was observed.
    pub fn status(&self) -> u16 {
        match self {
            Self::Transport { .. } => 0,
            Self::Timeout { .. } => 408,
            Self::Auth { status, .. } | Self::Http { status, .. } => *status,
        }
    }

    /// Human-readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Timeout { message }
            | Self::Auth { message, .. }
            | Self::Http { message, .. } => message,
        }
    }

    /// Raw response body, when a server response was observed.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Auth { body, .. } | Self::Http { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Whether this failure is transient and worth retrying.
    ///
    /// Authentication failures are never retried here; they go through the
    /// refresh-and-retry-once path instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Auth { .. } => false,
            _ => RETRYABLE_STATUSES.contains(&self.status()),
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
