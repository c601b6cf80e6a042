//! Token persistence via OS keyring
//!
//! Each storage key becomes one keyring entry under a shared service name
//! (Keychain on macOS, Secret Service on Linux, Windows Credential Manager on
//! Windows). The keyring is stateless; [`KeyringStorage`] only carries the
//! service name.

use crate::error::{Result, SessionwardError};
use crate::storage::StorageAdapter;

/// Keyring-backed key/value storage.
///
/// # Examples
///
/// ```no_run
/// use sessionward::storage::{KeyringStorage, StorageAdapter};
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = KeyringStorage::new("sessionward");
/// storage.set("jwt_token", "abc").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    /// Creates a store that namespaces entries under `service`.
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(map_keyring_error)
    }
}

/// Platform and access failures mean the backend cannot be used here;
/// everything else is an ordinary keyring error.
fn map_keyring_error(e: keyring::Error) -> anyhow::Error {
    match e {
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
            SessionwardError::StorageUnavailable(format!("keyring: {}", e)).into()
        }
        other => SessionwardError::Keyring(other).into(),
    }
}

#[async_trait::async_trait]
impl StorageAdapter for KeyringStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(map_keyring_error)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}
