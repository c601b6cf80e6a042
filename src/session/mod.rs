//! Session orchestration
//!
//! [`SessionController`] is the sole entry point for session operations:
//! login, logout, refresh-on-demand, and profile retrieval. It owns the
//! [`TokenStore`](crate::token_store::TokenStore), the authorized HTTP client
//! handle, and the pending post-login redirect. Build one with
//! [`SessionControllerBuilder`].
//!
//! # Module Layout
//!
//! - [`builder`]    -- wiring of configuration and injected collaborators
//! - [`controller`] -- the controller and its operations

pub mod builder;
pub mod controller;

pub use builder::SessionControllerBuilder;
pub use controller::SessionController;

/// Observable session state.
///
/// `Refreshing` is transient: while it is reported,
/// [`SessionController::is_authenticated`] still reflects the token held
/// before the refresh started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No access token held
    Anonymous,
    /// An access token is held
    Authenticated,
    /// A refresh request is in flight
    Refreshing,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}
