//! Session-scoped in-memory storage

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, SessionwardError};
use crate::storage::StorageAdapter;

/// Storage that lives exactly as long as the process.
///
/// # Examples
///
/// ```
/// use sessionward::storage::{MemoryStorage, StorageAdapter};
///
/// # tokio_test::block_on(async {
/// let storage = MemoryStorage::new();
/// storage.set("jwt_token", "abc").await.unwrap();
/// storage.remove("jwt_token").await.unwrap();
/// storage.remove("jwt_token").await.unwrap();
/// assert!(storage.get("jwt_token").await.unwrap().is_none());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| SessionwardError::Storage("memory storage lock poisoned".into()).into())
    }
}

#[async_trait::async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
