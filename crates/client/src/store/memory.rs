//! In-memory token store

use stridelog_domain::TokenPair;
use tokio::sync::RwLock;

use super::{StoreError, TokenStore};

/// Token store backed by process memory.
///
/// The default for tests and for sessions that should not outlive the
/// process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    current: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a pair.
    pub fn with_pair(pair: TokenPair) -> Self {
        Self { current: RwLock::new(Some(pair)) }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Option<TokenPair> {
        self.current.read().await.clone()
    }

    async fn set(&self, pair: TokenPair) -> Result<(), StoreError> {
        *self.current.write().await = Some(pair);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.current.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let store = MemoryTokenStore::new();
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn set_replaces_the_whole_pair() {
        let store = MemoryTokenStore::new();

        store.set(TokenPair::new("a1", "r1")).await.expect("set");
        store.set(TokenPair::new("a2", "r2")).await.expect("set");

        let pair = store.get().await.expect("pair");
        assert_eq!(pair.access_token, "a2");
        assert_eq!(pair.refresh_token, "r2");
    }

    #[tokio::test]
    async fn clear_removes_the_pair() {
        let store = MemoryTokenStore::with_pair(TokenPair::new("a1", "r1"));
        store.clear().await.expect("clear");
        assert!(store.get().await.is_none());
    }
}
