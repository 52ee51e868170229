//! File-backed token store

use std::path::{Path, PathBuf};

use stridelog_domain::TokenPair;
use tracing::warn;

use super::{StoreError, TokenStore};

/// Token store persisted as a JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written pair.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file path. The file does not need
    /// to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Option<TokenPair> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read token file");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token file is corrupt, ignoring");
                None
            }
        }
    }

    async fn set(&self, pair: TokenPair) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&pair)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("tokens.json"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn round_trips_a_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.set(TokenPair::new("a1", "r1")).await.expect("set");

        let pair = store.get().await.expect("pair");
        assert_eq!(pair.access_token, "a1");
        assert_eq!(pair.refresh_token, "r1");
    }

    #[tokio::test]
    async fn set_replaces_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.set(TokenPair::new("a1", "r1")).await.expect("set");
        store.set(TokenPair::new("a2", "r2")).await.expect("set");

        let pair = store.get().await.expect("pair");
        assert_eq!(pair.access_token, "a2");
        // The temp file must not linger after the rename
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.set(TokenPair::new("a1", "r1")).await.expect("set");
        store.clear().await.expect("clear");
        store.clear().await.expect("second clear");
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        tokio::fs::write(store.path(), b"{half a pair")
            .await
            .expect("write corrupt file");
        assert!(store.get().await.is_none());
    }
}
