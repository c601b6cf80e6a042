//! Routing abstraction and route metadata
//!
//! The crate does not own a router. Applications inject one through the
//! [`Router`] trait, which exposes two capabilities: `navigate` to a path, and
//! `before_each` to register a [`NavigationHook`] that runs before every
//! transition. [`guard::NavigationGuard`] is the hook that enforces
//! authentication requirements declared in [`RouteMeta`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod guard;

pub use guard::NavigationGuard;

/// Authentication requirements attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    /// Only authenticated sessions may enter
    #[serde(default)]
    pub requires_auth: bool,
    /// Only anonymous sessions may enter
    #[serde(default)]
    pub guest_only: bool,
    /// Where to send rejected visitors instead of the configured default
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// A navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Path without query or fragment, used for identity checks
    pub path: String,
    /// Full path including query and fragment, recorded for redirects
    pub full_path: String,
    /// Route metadata
    pub meta: RouteMeta,
}

impl Route {
    /// Creates a route with no metadata. `full_path` is `path` until
    /// [`with_full_path`](Self::with_full_path) says otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use sessionward::navigation::Route;
    ///
    /// let route = Route::new("/reports")
    ///     .with_full_path("/reports?year=2024")
    ///     .requires_auth();
    /// assert!(route.meta.requires_auth);
    /// assert_eq!(route.full_path, "/reports?year=2024");
    /// ```
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            full_path: path.clone(),
            path,
            meta: RouteMeta::default(),
        }
    }

    /// Sets the full path (query and fragment included).
    pub fn with_full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = full_path.into();
        self
    }

    /// Replaces the metadata.
    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Marks the route as requiring authentication.
    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    /// Marks the route as guest-only.
    pub fn guest_only(mut self) -> Self {
        self.meta.guest_only = true;
        self
    }

    /// Sets a per-route redirect override.
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.meta.redirect_to = Some(target.into());
        self
    }
}

/// Outcome of a pre-navigation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the transition proceed
    Allow,
    /// Abort the transition and navigate here instead
    Redirect(String),
    /// Abort the transition and stay where we are
    Block,
    /// A newer transition started while this one was being evaluated; the
    /// router should drop this evaluation's result
    Superseded,
}

/// Hook invoked before every route transition.
#[async_trait::async_trait]
pub trait NavigationHook: Send + Sync {
    /// Decides what happens to the transition from `from` to `to`.
    async fn before_navigate(&self, to: &Route, from: Option<&Route>) -> NavigationDecision;
}

/// Router capability injected by the application.
#[async_trait::async_trait]
pub trait Router: Send + Sync + std::fmt::Debug {
    /// Navigates to `path`.
    async fn navigate(&self, path: &str) -> Result<()>;

    /// Registers a hook to run before every transition.
    fn before_each(&self, hook: Arc<dyn NavigationHook>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_defaults() {
        let route = Route::new("/home");
        assert_eq!(route.full_path, "/home");
        assert_eq!(route.meta, RouteMeta::default());
    }

    #[test]
    fn test_route_builders() {
        let route = Route::new("/login").guest_only().redirect_to("/account");
        assert!(route.meta.guest_only);
        assert!(!route.meta.requires_auth);
        assert_eq!(route.meta.redirect_to.as_deref(), Some("/account"));
    }

    #[test]
    fn test_route_meta_deserializes_camel_case() {
        let meta: RouteMeta =
            serde_json::from_str(r#"{"requiresAuth": true, "redirectTo": "/login"}"#).unwrap();
        assert!(meta.requires_auth);
        assert!(!meta.guest_only);
        assert_eq!(meta.redirect_to.as_deref(), Some("/login"));
    }
}
