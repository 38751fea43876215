//! File System History Storage
//!
//! Information Hiding:
//! - File layout hidden from users: one file per key under a base directory
//! - Persistence mechanism independent of storage trait users

use super::HistoryStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// File system storage - each key is a JSON file
/// Values are stored as {base_path}/{key}.json
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| Error::Storage(format!("failed to create storage directory: {e}")))?;

        Ok(Self { base_path })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);

        if !path.exists() {
            tracing::debug!("[FileStore] No value under '{}'", key);
            return Ok(None);
        }

        let value = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Storage(format!("failed to read {:?}: {e}", path)))?;

        tracing::debug!("[FileStore] Read {} bytes from {:?}", value.len(), path);
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);

        fs::write(&path, value)
            .await
            .map_err(|e| Error::Storage(format!("failed to write {:?}: {e}", path)))?;

        tracing::debug!("[FileStore] Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);

        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| Error::Storage(format!("failed to remove {:?}: {e}", path)))?;
            tracing::debug!("[FileStore] Removed {:?}", path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store
            .set("conversation.history", "[{\"role\":\"user\"}]")
            .await
            .unwrap();
        let value = store.get("conversation.history").await.unwrap();

        assert_eq!(value.as_deref(), Some("[{\"role\":\"user\"}]"));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_then_get_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.set("key", "value").await.unwrap();
        store.remove("key").await.unwrap();
        store.remove("key").await.unwrap();

        assert!(store.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        // First instance writes
        {
            let store = FileStore::new(path.clone()).await.unwrap();
            store.set("persist-test", "kept").await.unwrap();
        }

        // Second instance reads the same directory
        {
            let store = FileStore::new(path).await.unwrap();
            let value = store.get("persist-test").await.unwrap();
            assert_eq!(value.as_deref(), Some("kept"));
        }
    }
}
