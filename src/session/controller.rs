//! Login, logout, refresh, and profile retrieval
//!
//! # Refresh single-flight
//!
//! [`SessionController::try_refresh_token`] lets only one refresh request be
//! in flight. Callers serialize on `refresh_gate`; each completed refresh
//! bumps `refresh_epoch`. A caller that observed epoch `n` before queueing and
//! finds a later epoch once it holds the gate was waiting on someone else's
//! refresh, and returns that outcome instead of issuing its own request.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::http::{AuthorizedClient, HttpClient, HttpRequest, HttpResponse};
use crate::navigation::Router;
use crate::path::{extract_optional, extract_string};
use crate::session::{SessionControllerBuilder, SessionStatus};
use crate::token_store::TokenStore;

/// Coordinates the token lifecycle with the HTTP client and router.
///
/// Each controller owns its own [`TokenStore`] and pending redirect; two
/// controllers in one process share nothing.
///
/// # Examples
///
/// ```no_run
/// use sessionward::config::SessionConfig;
/// use sessionward::session::SessionController;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = SessionConfig {
///     api_url: Some("https://api.example.com".to_string()),
///     ..Default::default()
/// };
/// let session = SessionController::builder(config).build().await?;
///
/// session
///     .login(&serde_json::json!({"username": "ada", "password": "hunter2"}))
///     .await?;
/// assert!(session.is_authenticated());
///
/// let profile = session.user().await;
/// println!("{:?}", profile);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionController {
    config: SessionConfig,
    tokens: Arc<TokenStore>,
    http: Arc<AuthorizedClient>,
    router: Option<Arc<dyn Router>>,
    pending_redirect: Mutex<Option<String>>,
    refresh_gate: tokio::sync::Mutex<bool>,
    refresh_epoch: AtomicU64,
    refreshing: AtomicBool,
}

impl SessionController {
    /// Starts building a controller from `config`.
    pub fn builder(config: SessionConfig) -> SessionControllerBuilder {
        SessionControllerBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        tokens: Arc<TokenStore>,
        http: Arc<AuthorizedClient>,
        router: Option<Arc<dyn Router>>,
    ) -> Self {
        Self {
            config,
            tokens,
            http,
            router,
            pending_redirect: Mutex::new(None),
            refresh_gate: tokio::sync::Mutex::new(false),
            refresh_epoch: AtomicU64::new(0),
            refreshing: AtomicBool::new(false),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The configuration this controller was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The token store backing this session.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// The authorized HTTP client handle. Every request sent through it
    /// carries the current bearer token.
    pub fn http(&self) -> Arc<AuthorizedClient> {
        Arc::clone(&self.http)
    }

    /// The injected router, if any.
    pub fn router(&self) -> Option<&Arc<dyn Router>> {
        self.router.as_ref()
    }

    /// Returns `true` iff an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    /// Current access token.
    pub fn token(&self) -> Option<String> {
        self.tokens.token()
    }

    /// Current session state.
    pub fn status(&self) -> SessionStatus {
        if self.refreshing.load(Ordering::SeqCst) {
            SessionStatus::Refreshing
        } else if self.tokens.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Route recorded by the navigation guard, to be visited after the next
    /// successful login.
    pub fn pending_redirect(&self) -> Option<String> {
        self.lock_pending().clone()
    }

    /// Records the route to visit after the next successful login. The last
    /// write wins.
    pub fn set_pending_redirect(&self, target: impl Into<String>) {
        *self.lock_pending() = Some(target.into());
    }

    /// Drops any pending redirect without visiting it.
    pub fn clear_pending_redirect(&self) {
        self.lock_pending().take();
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Posts `credentials` to the login endpoint and installs the returned
    /// tokens.
    ///
    /// The access token is read at `token_path` (and, in refresh mode, the
    /// refresh token at `refresh_token_path`) inside the payload located by
    /// `login.data_key`. When a token is found and a router is configured,
    /// navigates to the pending redirect, or to `default_redirect` when none
    /// is pending, and clears the pending redirect.
    ///
    /// A response without a token at the configured path is not an error:
    /// the raw payload is still returned and the token store is untouched.
    ///
    /// # Returns
    ///
    /// The raw response body.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx responses
    /// ([`SessionwardError::HttpStatus`](crate::error::SessionwardError::HttpStatus)).
    pub async fn login<C>(&self, credentials: &C) -> Result<Value>
    where
        C: Serialize + ?Sized,
    {
        let body = serde_json::to_value(credentials)?;
        let request = HttpRequest::post(self.config.login.url.as_str(), body);
        let payload = self.http.execute(request).await?.into_result()?;

        let data = extract_optional(&payload, self.config.login.data_key.as_deref());
        let token = data.and_then(|d| extract_string(d, &self.config.token_path));

        let Some(token) = token else {
            tracing::warn!(
                "Login response has no token at '{}'; session unchanged",
                self.config.token_path
            );
            return Ok(payload);
        };

        self.tokens.set_token(&token).await;
        if self.tokens.uses_refresh_token() {
            match data.and_then(|d| extract_string(d, &self.config.refresh_token_path)) {
                Some(refresh) => self.tokens.set_refresh_token(&refresh).await,
                None => tracing::debug!(
                    "Login response has no refresh token at '{}'",
                    self.config.refresh_token_path
                ),
            }
        }
        tracing::info!("Login succeeded");

        self.redirect_after_login().await;

        Ok(payload)
    }

    /// Clears both tokens. Calling it without an active session is a no-op.
    pub async fn logout(&self) {
        let was_authenticated = self.tokens.is_authenticated();
        self.tokens.clear().await;
        if was_authenticated {
            tracing::info!("Logged out");
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Returns `false` without any network call when refresh mode is disabled
    /// or no refresh token is held. Otherwise posts the refresh token to
    /// `refresh_url`; on success installs the new access token (and a rotated
    /// refresh token, if one is returned) and returns `true`. A transport
    /// failure or non-2xx response logs out and returns `false`.
    ///
    /// If the tokens change while the request is out (a login or logout
    /// completed meanwhile), the response is discarded: nothing is installed,
    /// nothing is cleared, and the result reports whether a token is held.
    ///
    /// Concurrent callers share one in-flight refresh and its outcome.
    pub async fn try_refresh_token(&self) -> bool {
        if !self.tokens.uses_refresh_token() {
            return false;
        }

        let observed = self.refresh_epoch.load(Ordering::SeqCst);
        let mut last_outcome = self.refresh_gate.lock().await;
        if self.refresh_epoch.load(Ordering::SeqCst) != observed {
            tracing::debug!("Joined an in-flight refresh");
            return *last_outcome;
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            return false;
        };

        let outcome = {
            let _flag = RefreshingFlag::raise(&self.refreshing);
            self.perform_refresh(&refresh_token).await
        };

        *last_outcome = outcome;
        self.refresh_epoch.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    /// Fetches the profile endpoint.
    ///
    /// Returns `None` without a network call when unauthenticated, and
    /// `None` on any failure. Otherwise returns the payload located by
    /// `profile.data_key`.
    pub async fn user(&self) -> Option<Value> {
        if !self.tokens.is_authenticated() {
            return None;
        }

        let request = HttpRequest::get(self.config.profile.url.as_str());
        let payload = match self.http.execute(request).await.and_then(|r| r.into_result()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Profile request failed: {}", e);
                return None;
            }
        };

        extract_optional(&payload, self.config.profile.data_key.as_deref()).cloned()
    }

    /// Sends `request` through the authorized client, refreshing and
    /// re-issuing it exactly once if the server answers `401`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures. Non-2xx responses are returned, not
    /// raised.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http.execute(request.clone()).await?;
        if response.status != 401 {
            return Ok(response);
        }

        tracing::debug!("Request to {} returned 401, attempting refresh", request.url);
        if self.try_refresh_token().await {
            self.http.execute(request).await
        } else {
            Ok(response)
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    async fn perform_refresh(&self, refresh_token: &str) -> bool {
        let started_with = self.tokens.session();

        let mut body = serde_json::Map::new();
        body.insert(self.config.refresh_body_key.clone(), json!(refresh_token));
        let request = HttpRequest::post(self.config.refresh_url.as_str(), Value::Object(body));

        let result = self.http.execute(request).await.and_then(|r| r.into_result());

        // A login or logout finished while the request was out; its tokens win.
        if self.tokens.session() != started_with {
            tracing::debug!("Session changed during refresh; discarding refresh response");
            return self.tokens.is_authenticated();
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Token refresh failed, logging out: {}", e);
                self.logout().await;
                return false;
            }
        };

        let data = extract_optional(&payload, self.config.refresh_data_key.as_deref());
        let Some(token) = data.and_then(|d| extract_string(d, &self.config.token_path)) else {
            tracing::warn!(
                "Refresh response has no token at '{}'; keeping current session",
                self.config.token_path
            );
            return false;
        };

        self.tokens.set_token(&token).await;
        if let Some(rotated) = data.and_then(|d| extract_string(d, &self.config.refresh_token_path))
        {
            self.tokens.set_refresh_token(&rotated).await;
        }
        tracing::info!("Token refreshed");
        true
    }

    async fn redirect_after_login(&self) {
        let Some(router) = &self.router else {
            return;
        };

        let target = self
            .lock_pending()
            .take()
            .unwrap_or_else(|| self.config.default_redirect.clone());

        tracing::debug!("Redirecting after login to {}", target);
        if let Err(e) = router.navigate(&target).await {
            tracing::warn!("Post-login navigation to {} failed: {}", target, e);
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<String>> {
        self.pending_redirect
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps `status()` at `Refreshing` for as long as it lives, including when
/// the refresh future is dropped mid-flight.
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::http::HttpResponse;
    use crate::storage::{MemoryStorage, StorageAdapter};
    use crate::test_utils::{FakeRouter, ScriptedHttpClient};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn make_controller(
        config: SessionConfig,
        http: Arc<ScriptedHttpClient>,
        router: Option<Arc<FakeRouter>>,
    ) -> Arc<SessionController> {
        let mut builder = SessionController::builder(config)
            .http_client(http)
            .storage(Arc::new(MemoryStorage::new()));
        if let Some(router) = router {
            builder = builder.router(router);
        }
        builder.build().await.expect("controller builds")
    }

    fn refresh_config() -> SessionConfig {
        SessionConfig {
            use_refresh_token: true,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // login()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_installs_token_at_configured_paths() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(
            200,
            json!({"result": {"data": {"jwt": "abc123"}}}),
        ));
        let mut config = SessionConfig {
            token_path: "data.jwt".to_string(),
            ..Default::default()
        };
        config.login.data_key = Some("result".to_string());

        let session = make_controller(config, http.clone(), None).await;
        let payload = session.login(&json!({"u": "ada"})).await.unwrap();

        assert_eq!(payload, json!({"result": {"data": {"jwt": "abc123"}}}));
        assert_eq!(session.token().as_deref(), Some("abc123"));
        assert_eq!(session.status(), SessionStatus::Authenticated);

        let sent = http.requests();
        assert_eq!(sent[0].url, "/api/login");
        assert_eq!(sent[0].body, Some(json!({"u": "ada"})));
    }

    #[tokio::test]
    async fn test_login_without_token_leaves_store_unchanged() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"message": "check email"})));
        let router = Arc::new(FakeRouter::new());

        let session = make_controller(SessionConfig::default(), http, Some(router.clone())).await;
        let payload = session.login(&json!({})).await.unwrap();

        assert_eq!(payload, json!({"message": "check email"}));
        assert!(!session.is_authenticated());
        assert!(router.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_login_propagates_rejection() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(401, json!({"error": "bad credentials"})));

        let session = make_controller(SessionConfig::default(), http, None).await;
        let err = session.login(&json!({})).await.unwrap_err();

        let typed = err
            .downcast_ref::<crate::error::SessionwardError>()
            .expect("typed error");
        assert_eq!(typed.status(), Some(401));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_propagates_transport_failure() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_transport_error("connection refused");

        let session = make_controller(SessionConfig::default(), http, None).await;
        let err = session.login(&json!({})).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_login_stores_refresh_token_only_in_refresh_mode() {
        let body = json!({"token": "a", "refresh_token": "r"});

        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, body.clone()));
        let session = make_controller(refresh_config(), http, None).await;
        session.login(&json!({})).await.unwrap();
        assert_eq!(session.tokens().refresh_token().as_deref(), Some("r"));

        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, body));
        let session = make_controller(SessionConfig::default(), http, None).await;
        session.login(&json!({})).await.unwrap();
        assert!(session.tokens().refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_login_navigates_to_pending_then_default() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"token": "a"})));
        http.push_response(HttpResponse::new(200, json!({"token": "b"})));
        let router = Arc::new(FakeRouter::new());

        let session = make_controller(SessionConfig::default(), http, Some(router.clone())).await;
        session.set_pending_redirect("/reports?year=2024");

        session.login(&json!({})).await.unwrap();
        assert!(session.pending_redirect().is_none());

        session.login(&json!({})).await.unwrap();
        assert_eq!(
            router.navigations(),
            vec!["/reports?year=2024".to_string(), "/dashboard".to_string()]
        );
    }

    #[tokio::test]
    async fn test_login_succeeds_even_if_navigation_fails() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"token": "a"})));
        let router = Arc::new(FakeRouter::failing());

        let session = make_controller(SessionConfig::default(), http, Some(router)).await;
        assert!(session.login(&json!({})).await.is_ok());
        assert!(session.is_authenticated());
    }

    // -----------------------------------------------------------------------
    // logout()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let http = Arc::new(ScriptedHttpClient::new());
        let session = make_controller(refresh_config(), http, None).await;

        session.logout().await;
        assert!(!session.is_authenticated());

        session.tokens().set_token("a").await;
        session.tokens().set_refresh_token("r").await;
        session.logout().await;
        session.logout().await;
        assert!(!session.is_authenticated());
        assert!(session.tokens().refresh_token().is_none());
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    // -----------------------------------------------------------------------
    // try_refresh_token()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_disabled_never_calls_network() {
        let http = Arc::new(ScriptedHttpClient::new());
        let session = make_controller(SessionConfig::default(), http.clone(), None).await;
        session.tokens().set_token("a").await;

        assert!(!session.try_refresh_token().await);
        assert!(http.requests().is_empty());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_returns_false() {
        let http = Arc::new(ScriptedHttpClient::new());
        let session = make_controller(refresh_config(), http.clone(), None).await;

        assert!(!session.try_refresh_token().await);
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_success_installs_new_tokens() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(
            200,
            json!({"token": "new_access", "refresh_token": "new_refresh"}),
        ));
        let session = make_controller(refresh_config(), http.clone(), None).await;
        session.tokens().set_token("old_access").await;
        session.tokens().set_refresh_token("old_refresh").await;

        assert!(session.try_refresh_token().await);
        assert_eq!(session.token().as_deref(), Some("new_access"));
        assert_eq!(
            session.tokens().refresh_token().as_deref(),
            Some("new_refresh")
        );

        let sent = http.requests();
        assert_eq!(sent[0].url, "/api/refresh");
        assert_eq!(sent[0].body, Some(json!({"refresh_token": "old_refresh"})));
    }

    #[tokio::test]
    async fn test_refresh_failure_logs_out() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(401, json!({"error": "expired"})));
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_token("a").await;
        session.tokens().set_refresh_token("r").await;

        assert!(!session.try_refresh_token().await);
        assert!(!session.is_authenticated());
        assert!(session.tokens().refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_token_in_response_keeps_session() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"unexpected": true})));
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_token("a").await;
        session.tokens().set_refresh_token("r").await;

        assert!(!session.try_refresh_token().await);
        assert_eq!(session.token().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_flight() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"token": "fresh"})));
        http.set_delay(std::time::Duration::from_millis(50));
        let session = make_controller(refresh_config(), http.clone(), None).await;
        session.tokens().set_refresh_token("r").await;

        let (a, b, c) = tokio::join!(
            session.try_refresh_token(),
            session.try_refresh_token(),
            session.try_refresh_token()
        );

        assert!(a && b && c);
        assert_eq!(http.requests().len(), 1);
        assert_eq!(session.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_hit_endpoint() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"token": "one"})));
        http.push_response(HttpResponse::new(200, json!({"token": "two"})));
        let session = make_controller(refresh_config(), http.clone(), None).await;
        session.tokens().set_refresh_token("r").await;

        assert!(session.try_refresh_token().await);
        assert!(session.try_refresh_token().await);
        assert_eq!(http.requests().len(), 2);
        assert_eq!(session.token().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_status_reports_refreshing_without_changing_authentication() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(200, json!({"token": "fresh"})));
        http.set_delay(std::time::Duration::from_millis(50));
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_refresh_token("r").await;

        let observer = async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            (session.status(), session.is_authenticated())
        };
        let (refreshed, (status, authenticated)) =
            tokio::join!(session.try_refresh_token(), observer);

        assert!(refreshed);
        assert_eq!(status, SessionStatus::Refreshing);
        assert!(!authenticated);
        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_does_not_stay_refreshing() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_delayed_response(
            HttpResponse::new(200, json!({"token": "fresh"})),
            Duration::from_millis(200),
        );
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_token("a").await;
        session.tokens().set_refresh_token("r").await;

        let attempt =
            tokio::time::timeout(Duration::from_millis(20), session.try_refresh_token()).await;

        assert!(attempt.is_err());
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.token().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_log_out_newer_login() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_delayed_response(
            HttpResponse::new(401, json!({"error": "expired"})),
            Duration::from_millis(100),
        );
        http.push_response(HttpResponse::new(
            200,
            json!({"token": "NEW", "refresh_token": "R2"}),
        ));
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_refresh_token("R1").await;

        let login = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.login(&json!({})).await
        };
        let (refreshed, login) = tokio::join!(session.try_refresh_token(), login);

        assert!(login.is_ok());
        assert!(refreshed);
        assert_eq!(session.token().as_deref(), Some("NEW"));
        assert_eq!(session.tokens().refresh_token().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_stale_refresh_success_does_not_overwrite_newer_login() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_delayed_response(
            HttpResponse::new(200, json!({"token": "OLD", "refresh_token": "R_OLD"})),
            Duration::from_millis(100),
        );
        http.push_response(HttpResponse::new(
            200,
            json!({"token": "NEW", "refresh_token": "R2"}),
        ));
        let session = make_controller(refresh_config(), http, None).await;
        session.tokens().set_refresh_token("R1").await;

        let login = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.login(&json!({})).await
        };
        let (_, login) = tokio::join!(session.try_refresh_token(), login);

        assert!(login.is_ok());
        assert_eq!(session.token().as_deref(), Some("NEW"));
        assert_eq!(session.tokens().refresh_token().as_deref(), Some("R2"));
    }

    // -----------------------------------------------------------------------
    // user()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_user_short_circuits_when_anonymous() {
        let http = Arc::new(ScriptedHttpClient::new());
        let session = make_controller(SessionConfig::default(), http.clone(), None).await;

        assert!(session.user().await.is_none());
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_user_returns_data_key_payload_with_bearer() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(
            200,
            json!({"data": {"name": "Ada", "id": 7}}),
        ));
        let mut config = SessionConfig::default();
        config.profile.data_key = Some("data".to_string());
        let session = make_controller(config, http.clone(), None).await;
        session.tokens().set_token("abc").await;

        let user = session.user().await;
        assert_eq!(user, Some(json!({"name": "Ada", "id": 7})));
        let sent = http.requests();
        assert_eq!(sent[0].url, "/api/me");
        assert_eq!(sent[0].header("Authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_user_swallows_failures() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(500, json!("boom")));
        http.push_transport_error("timeout");
        let session = make_controller(SessionConfig::default(), http, None).await;
        session.tokens().set_token("abc").await;

        assert!(session.user().await.is_none());
        assert!(session.user().await.is_none());
        assert!(session.is_authenticated());
    }

    // -----------------------------------------------------------------------
    // send()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_retries_once_after_refresh() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(401, json!(null)));
        http.push_response(HttpResponse::new(200, json!({"token": "fresh"})));
        http.push_response(HttpResponse::new(200, json!({"items": []})));
        let session = make_controller(refresh_config(), http.clone(), None).await;
        session.tokens().set_token("stale").await;
        session.tokens().set_refresh_token("r").await;

        let response = session.send(HttpRequest::get("/api/items")).await.unwrap();
        assert_eq!(response.status, 200);

        let sent = http.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].header("Authorization"), Some("Bearer stale"));
        assert_eq!(sent[1].url, "/api/refresh");
        assert_eq!(sent[2].header("Authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn test_send_returns_401_when_refresh_unavailable() {
        let http = Arc::new(ScriptedHttpClient::new());
        http.push_response(HttpResponse::new(401, json!(null)));
        let session = make_controller(SessionConfig::default(), http.clone(), None).await;

        let response = session.send(HttpRequest::get("/api/items")).await.unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(http.requests().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Independence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_controllers_do_not_share_state() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        let a = SessionController::builder(SessionConfig::default())
            .http_client(Arc::new(ScriptedHttpClient::new()))
            .storage(Arc::clone(&storage))
            .build()
            .await
            .unwrap();
        let b = SessionController::builder(SessionConfig::default())
            .http_client(Arc::new(ScriptedHttpClient::new()))
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .await
            .unwrap();

        a.set_pending_redirect("/a");
        a.tokens().set_token("a").await;

        assert!(b.pending_redirect().is_none());
        assert!(!b.is_authenticated());
    }
}
