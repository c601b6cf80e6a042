//! In-memory token cache mirrored to a storage backend
//!
//! [`TokenStore`] holds the current access and refresh tokens. Reads never
//! touch storage: memory is the cache, storage is the durability layer,
//! hydrated once after construction. Every mutation updates memory first and
//! then mirrors the change to the [`StorageAdapter`]. Storage failures are
//! logged and absorbed, so an unusable backend degrades the store to
//! memory-only operation.
//!
//! Refresh tokens are only tracked when refresh-token mode is enabled;
//! otherwise the refresh setters and clearers are no-ops that never reach
//! storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::storage::StorageAdapter;

/// Snapshot of the tokens held by a [`TokenStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer credential for API calls
    pub access_token: Option<String>,
    /// Credential used only to obtain a new access token
    pub refresh_token: Option<String>,
}

/// Access/refresh token holder with storage mirroring.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sessionward::config::SessionConfig;
/// use sessionward::storage::MemoryStorage;
/// use sessionward::token_store::TokenStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let storage = Arc::new(MemoryStorage::new());
/// let store = TokenStore::open(storage.clone(), &SessionConfig::default()).await;
/// assert!(!store.is_authenticated());
///
/// store.set_token("abc").await;
/// assert_eq!(store.token().as_deref(), Some("abc"));
///
/// // A fresh store over the same storage hydrates the token.
/// let reopened = TokenStore::open(storage, &SessionConfig::default()).await;
/// assert!(reopened.is_authenticated());
/// # }
/// ```
#[derive(Debug)]
pub struct TokenStore {
    storage: Arc<dyn StorageAdapter>,
    token_key: String,
    refresh_token_key: String,
    use_refresh_token: bool,
    session: RwLock<Session>,
    /// Set once a write reaches the access token, so late hydration
    /// cannot overwrite it.
    access_written: AtomicBool,
    refresh_written: AtomicBool,
    ready_tx: watch::Sender<bool>,
}

impl TokenStore {
    /// Creates an empty, not-yet-hydrated store.
    ///
    /// Until [`hydrate`](Self::hydrate) completes, [`is_authenticated`]
    /// reports `false` even if storage holds a token.
    ///
    /// [`is_authenticated`]: Self::is_authenticated
    pub fn new(storage: Arc<dyn StorageAdapter>, config: &SessionConfig) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            storage,
            token_key: config.token_key.clone(),
            refresh_token_key: config.refresh_token_key.clone(),
            use_refresh_token: config.use_refresh_token,
            session: RwLock::new(Session::default()),
            access_written: AtomicBool::new(false),
            refresh_written: AtomicBool::new(false),
            ready_tx,
        }
    }

    /// Creates a store and waits for hydration to finish.
    pub async fn open(storage: Arc<dyn StorageAdapter>, config: &SessionConfig) -> Self {
        let store = Self::new(storage, config);
        store.hydrate().await;
        store
    }

    /// Loads tokens from storage into memory, once.
    ///
    /// Values written through this store while hydration was suspended win
    /// over what storage returned. Storage failures leave the slot empty.
    pub async fn hydrate(&self) {
        if self.is_ready() {
            return;
        }

        let (access, refresh) = if self.use_refresh_token {
            futures::future::join(
                self.load(&self.token_key),
                self.load(&self.refresh_token_key),
            )
            .await
        } else {
            (self.load(&self.token_key).await, None)
        };

        {
            let mut session = self.write_session();
            if !self.access_written.load(Ordering::SeqCst) {
                session.access_token = access;
            }
            if !self.refresh_written.load(Ordering::SeqCst) {
                session.refresh_token = refresh;
            }
            tracing::debug!(
                authenticated = session.access_token.is_some(),
                "Token store hydrated"
            );
        }

        self.ready_tx.send_replace(true);
    }

    /// Waits until hydration has completed.
    pub async fn ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Returns `true` once hydration has completed.
    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Returns `true` iff an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.read_session().access_token.is_some()
    }

    /// Current access token, from memory.
    pub fn token(&self) -> Option<String> {
        self.read_session().access_token.clone()
    }

    /// Current refresh token, from memory. Always `None` when refresh mode is
    /// disabled.
    pub fn refresh_token(&self) -> Option<String> {
        self.read_session().refresh_token.clone()
    }

    /// Snapshot of both tokens.
    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    /// Whether refresh-token mode is enabled.
    pub fn uses_refresh_token(&self) -> bool {
        self.use_refresh_token
    }

    /// Installs a new access token.
    pub async fn set_token(&self, token: &str) {
        self.access_written.store(true, Ordering::SeqCst);
        self.write_session().access_token = Some(token.to_string());
        self.persist(&self.token_key, Some(token)).await;
    }

    /// Installs a new refresh token. No-op when refresh mode is disabled.
    pub async fn set_refresh_token(&self, token: &str) {
        if !self.use_refresh_token {
            return;
        }
        self.refresh_written.store(true, Ordering::SeqCst);
        self.write_session().refresh_token = Some(token.to_string());
        self.persist(&self.refresh_token_key, Some(token)).await;
    }

    /// Drops the access token.
    pub async fn clear_token(&self) {
        self.access_written.store(true, Ordering::SeqCst);
        self.write_session().access_token = None;
        self.persist(&self.token_key, None).await;
    }

    /// Drops the refresh token. No-op when refresh mode is disabled.
    pub async fn clear_refresh_token(&self) {
        if !self.use_refresh_token {
            return;
        }
        self.refresh_written.store(true, Ordering::SeqCst);
        self.write_session().refresh_token = None;
        self.persist(&self.refresh_token_key, None).await;
    }

    /// Drops both tokens.
    pub async fn clear(&self) {
        self.clear_token().await;
        self.clear_refresh_token().await;
    }

    async fn load(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read '{}' from storage, continuing without it: {}", key, e);
                None
            }
        }
    }

    async fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(v) => self.storage.set(key, v).await,
            None => self.storage.remove(key).await,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to mirror '{}' to storage, keeping it in memory only: {}", key, e);
        }
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }
}
