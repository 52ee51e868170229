//! Token persistence
//!
//! The client reads and writes the session [`TokenPair`] exclusively through
//! the [`TokenStore`] trait, so the persistence backend is swappable: the
//! in-memory store for tests and ephemeral sessions, the file-backed store
//! for durable desktop sessions.

mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use async_trait::async_trait;
use stridelog_domain::TokenPair;
use thiserror::Error;

/// Errors from the persistence backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored payload could not be encoded or decoded
    #[error("token store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent storage for the current token pair.
///
/// Holds zero or one pair. `set` replaces the whole pair atomically; there
/// are no transactional guarantees beyond that.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current pair, if a session exists.
    async fn get(&self) -> Option<TokenPair>;

    /// Replace the stored pair.
    async fn set(&self, pair: TokenPair) -> Result<(), StoreError>;

    /// Remove the stored pair.
    async fn clear(&self) -> Result<(), StoreError>;
}
