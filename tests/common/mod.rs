use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use wiremock::MockServer;

use sessionward::navigation::{NavigationDecision, NavigationHook, Route, Router};
use sessionward::storage::{MemoryStorage, StorageAdapter};
use sessionward::{SessionConfig, SessionController};

/// Router double recording every navigation and running the registered hook
/// on demand.
#[derive(Default)]
pub struct RecordingRouter {
    navigations: Mutex<Vec<String>>,
    hook: Mutex<Option<Arc<dyn NavigationHook>>>,
}

impl std::fmt::Debug for RecordingRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingRouter")
            .field("navigations", &self.navigations)
            .finish()
    }
}

#[allow(dead_code)]
impl RecordingRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// Evaluates the registered hook for a transition to `to`.
    pub async fn visit(&self, to: &Route) -> NavigationDecision {
        let hook = self.hook.lock().unwrap().clone();
        match hook {
            Some(hook) => hook.before_navigate(to, None).await,
            None => NavigationDecision::Allow,
        }
    }
}

#[async_trait::async_trait]
impl Router for RecordingRouter {
    async fn navigate(&self, path: &str) -> sessionward::Result<()> {
        self.navigations.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn before_each(&self, hook: Arc<dyn NavigationHook>) {
        *self.hook.lock().unwrap() = Some(hook);
    }
}

/// Configuration pointing the default HTTP client at `server`.
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> SessionConfig {
    SessionConfig {
        api_url: Some(server.uri()),
        ..Default::default()
    }
}

/// Same as [`config_for`] with refresh-token mode enabled.
#[allow(dead_code)]
pub fn refresh_config_for(server: &MockServer) -> SessionConfig {
    SessionConfig {
        use_refresh_token: true,
        ..config_for(server)
    }
}

/// Builds a controller over in-memory storage using the default reqwest client.
#[allow(dead_code)]
pub async fn build_session(
    config: SessionConfig,
    router: Option<Arc<RecordingRouter>>,
) -> Arc<SessionController> {
    build_session_with_storage(config, router, Arc::new(MemoryStorage::new())).await
}

#[allow(dead_code)]
pub async fn build_session_with_storage(
    config: SessionConfig,
    router: Option<Arc<RecordingRouter>>,
    storage: Arc<dyn StorageAdapter>,
) -> Arc<SessionController> {
    let mut builder = SessionController::builder(config).storage(storage);
    if let Some(router) = router {
        builder = builder.router(router);
    }
    builder.build().await.expect("failed to build session controller")
}

#[allow(dead_code)]
pub fn temp_storage_path() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let path = tmp.path().join("session.json");
    (tmp, path)
}
