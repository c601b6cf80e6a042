//! Token storage backends
//!
//! This module defines the [`StorageAdapter`] trait that every backend
//! satisfies, and [`create_storage`], which picks a backend from the
//! configured [`StorageKind`]. Concrete implementations live in submodules:
//!
//! - [`memory::MemoryStorage`] -- session-scoped, lives as long as the process
//! - [`file::FileStorage`] -- persistent-local, a JSON map on disk
//! - [`cookie::CookieStorage`] -- cookie-based, through an async cookie API or
//!   a synchronous cookie-string fallback
//! - [`keyring_store::KeyringStorage`] -- persistent, in the OS credential store
//!
//! All methods are `async` so that backends with asynchronous native APIs fit
//! the same seam. A backend that cannot work in the current environment
//! reports [`SessionwardError::StorageUnavailable`]; the
//! [`TokenStore`](crate::token_store::TokenStore) absorbs that and carries on
//! in memory.

use std::sync::Arc;

use directories::ProjectDirs;

use crate::config::{SessionConfig, StorageKind};
use crate::error::{Result, SessionwardError};

pub mod cookie;
pub mod file;
pub mod keyring_store;
pub mod memory;

pub use cookie::{CookieApi, CookieStorage};
pub use file::FileStorage;
pub use keyring_store::KeyringStorage;
pub use memory::MemoryStorage;

/// Uniform key/value access over a storage backend.
///
/// # Examples
///
/// ```
/// use sessionward::storage::{MemoryStorage, StorageAdapter};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let storage = MemoryStorage::new();
/// storage.set("jwt_token", "abc").await?;
/// assert_eq!(storage.get("jwt_token").await?.as_deref(), Some("abc"));
/// storage.remove("jwt_token").await?;
/// assert!(storage.get("jwt_token").await?.is_none());
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait StorageAdapter: Send + Sync + std::fmt::Debug {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Builds the storage backend selected by `config.storage`.
///
/// # Errors
///
/// Returns [`SessionwardError::StorageUnavailable`] when `local` storage is
/// selected, no `storage_path` is configured, and the platform data directory
/// cannot be determined.
pub fn create_storage(config: &SessionConfig) -> Result<Arc<dyn StorageAdapter>> {
    match config.storage {
        StorageKind::Session => Ok(Arc::new(MemoryStorage::new())),
        StorageKind::Cookie => Ok(Arc::new(CookieStorage::new())),
        StorageKind::Keyring => Ok(Arc::new(KeyringStorage::new(&config.keyring_service))),
        StorageKind::Local => {
            let path = match &config.storage_path {
                Some(p) => p.clone(),
                None => default_storage_path()?,
            };
            Ok(Arc::new(FileStorage::new(path)))
        }
    }
}

/// Default location of the persistent-local storage file.
fn default_storage_path() -> Result<std::path::PathBuf> {
    let proj_dirs = ProjectDirs::from("dev", "sessionward", "sessionward").ok_or_else(|| {
        SessionwardError::StorageUnavailable("Could not determine data directory".into())
    })?;
    Ok(proj_dirs.data_dir().join("session.json"))
}
