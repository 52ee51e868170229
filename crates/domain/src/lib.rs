//! Domain types for the StrideLog API client.
//!
//! Wire-level types (token pairs, refresh payloads), the [`ApiError`]
//! taxonomy, and the pure error classifier shared by everything that talks
//! to the StrideLog backend.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod classify;
pub mod errors;
pub mod tokens;

pub use classify::{auth_failure_message, classify_status, extract_server_message};
pub use errors::{ApiError, Result, RETRYABLE_STATUSES};
pub use tokens::{RefreshRequest, RefreshResponse, TokenPair};
