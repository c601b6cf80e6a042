//! Construction of a [`SessionController`]

use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::http::{AuthorizedClient, HttpClient, RequestAuthorizer, ReqwestClient};
use crate::navigation::{NavigationGuard, Router};
use crate::session::SessionController;
use crate::storage::{create_storage, MemoryStorage, StorageAdapter};
use crate::token_store::TokenStore;

/// Builder for [`SessionController`].
///
/// Every collaborator is optional. Without an HTTP client a [`ReqwestClient`]
/// is created from `api_url`; without storage the configured backend is
/// created, falling back to memory when it is unavailable; without a router
/// no post-login navigation happens and no guard is installed.
#[derive(Debug)]
pub struct SessionControllerBuilder {
    config: SessionConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    router: Option<Arc<dyn Router>>,
    storage: Option<Arc<dyn StorageAdapter>>,
}

impl SessionControllerBuilder {
    /// Starts a builder from `config`.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            http_client: None,
            router: None,
            storage: None,
        }
    }

    /// Uses `client` as the transport. The controller wraps it with the
    /// bearer-token authorizer.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Uses `router` for post-login navigation and installs the navigation
    /// guard on it.
    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Uses `storage` instead of the backend named in the configuration.
    pub fn storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Validates the configuration, hydrates the token store, and wires the
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the default HTTP
    /// client cannot be created.
    pub async fn build(self) -> Result<Arc<SessionController>> {
        self.config.validate()?;

        let storage = match self.storage {
            Some(storage) => storage,
            None => create_storage(&self.config).unwrap_or_else(|e| {
                tracing::warn!(
                    "Storage backend '{}' unavailable, keeping tokens in memory: {}",
                    self.config.storage,
                    e
                );
                Arc::new(MemoryStorage::new())
            }),
        };

        let tokens = Arc::new(TokenStore::open(storage, &self.config).await);

        let transport: Arc<dyn HttpClient> = match self.http_client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::new(
                self.config.api_url.as_deref(),
                Duration::from_secs(self.config.request_timeout_seconds),
            )?),
        };
        let http = AuthorizedClient::new(transport)
            .with_interceptor(Arc::new(RequestAuthorizer::new(Arc::clone(&tokens))));

        let controller = Arc::new(SessionController::from_parts(
            self.config,
            tokens,
            Arc::new(http),
            self.router.clone(),
        ));

        if let Some(router) = &self.router {
            router.before_each(Arc::new(NavigationGuard::new(&controller)));
            tracing::debug!("Navigation guard installed");
        }

        Ok(controller)
    }
}
