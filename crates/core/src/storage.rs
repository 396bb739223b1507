//! Key-value storage capability
//!
//! The client persists exactly one value (the auth token) through this
//! trait. The concrete device storage is supplied by the embedding
//! application; [`MemoryStorage`] and [`FileStorage`] cover tests and the CLI.

use crate::error::{Error, ErrorCode, Result, ResultExt};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Asynchronous string key-value store
#[async_trait]
pub trait KeyValueStorage: Send + Sync + fmt::Debug {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// JSON-file backed storage
///
/// The whole map is rewritten on every change through a temporary file and
/// a rename, so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage file name inside the data directory
    pub const FILE_NAME: &'static str = "session.json";

    /// Use an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Use `<data dir>/rehab/session.json`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_dir().ok_or_else(Error::storage_unavailable)?;
        Ok(Self::new(dir.join("rehab").join(Self::FILE_NAME)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::storage_corrupted(&self.path).with_source(e)
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(Error::from(err)).context("Reading storage file"),
        }
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Error::from)
                .context("Creating storage directory")?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&tmp, content)
            .await
            .map_err(Error::from)
            .context("Writing storage file")?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(Error::from)
            .context("Replacing storage file")?;

        debug!(path = %self.path.display(), keys = values.len(), "Storage persisted");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values).await
    }

    /// A corrupted file is reset to empty, since no key can be read from it
    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = match self.load().await {
            Ok(values) => values,
            Err(err) if err.code == ErrorCode::StorageCorrupted => {
                warn!(path = %self.path.display(), error = %err, "Resetting corrupted storage file");
                return self.persist(&BTreeMap::new()).await;
            }
            Err(err) => return Err(err),
        };
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("auth_token").await.unwrap(), None);

        storage.set("auth_token", "abc").await.unwrap();
        assert_eq!(storage.get("auth_token").await.unwrap().as_deref(), Some("abc"));

        storage.remove("auth_token").await.unwrap();
        storage.remove("auth_token").await.unwrap();
        assert_eq!(storage.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStorage::new(&path).set("auth_token", "tok").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("auth_token").await.unwrap().as_deref(), Some("tok"));

        reopened.remove("auth_token").await.unwrap();
        assert_eq!(FileStorage::new(&path).get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));

        assert_eq!(storage.get("anything").await.unwrap(), None);
        storage.remove("anything").await.unwrap();
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn test_file_storage_reports_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStorage::new(&path).get("auth_token").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageCorrupted);
    }

    #[tokio::test]
    async fn test_remove_resets_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = FileStorage::new(&path);

        storage.remove("auth_token").await.unwrap();

        assert_eq!(storage.get("auth_token").await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }
}
