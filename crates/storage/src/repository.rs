use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Durable key-value storage for session snapshots.
///
/// Each key holds one complete serialized snapshot. A save replaces the
/// previous value in a single write; a missing key means "no prior session".
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the raw snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the snapshot under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a raw value, bypassing serialization.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Read a raw value without going through the async trait.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryRepository {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get_raw(key)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put_raw(key, value)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Snapshot storage behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(InMemoryRepository::new());
        Self { snapshots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_replaces_previous_value() {
        let repo = InMemoryRepository::new();
        repo.save("k", "one").await.unwrap();
        repo.save("k", "two").await.unwrap();
        assert_eq!(repo.load("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn remove_missing_key_is_ok() {
        let repo = InMemoryRepository::new();
        repo.remove("nothing").await.unwrap();
        assert!(repo.load("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let repo = InMemoryRepository::new();
        repo.save("a", "1").await.unwrap();
        repo.save("b", "2").await.unwrap();
        repo.remove("a").await.unwrap();
        assert!(repo.load("a").await.unwrap().is_none());
        assert_eq!(repo.load("b").await.unwrap().as_deref(), Some("2"));
    }
}
