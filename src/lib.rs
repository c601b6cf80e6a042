//! Sessionward - client-side bearer token session management
//!
//! This library acquires, persists, injects, and refreshes a bearer
//! credential for outbound HTTP calls, and gates navigation on
//! authentication status.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: key/value storage backends (memory, file, cookie, keyring)
//! - `path`: dotted-path extraction from JSON response payloads
//! - `token_store`: in-memory token cache mirrored to storage
//! - `http`: HTTP client abstraction and bearer-token request authorization
//! - `session`: the session controller (login, logout, refresh, profile)
//! - `navigation`: router abstraction and the authentication guard
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: the command-line front end
//!
//! # Example
//!
//! ```no_run
//! use sessionward::{SessionConfig, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::load("sessionward.yaml")?;
//!     let session = SessionController::builder(config).build().await?;
//!
//!     if !session.is_authenticated() {
//!         session
//!             .login(&serde_json::json!({"username": "ada", "password": "hunter2"}))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod path;
pub mod session;
pub mod storage;
pub mod token_store;

// Re-export commonly used types
pub use config::SessionConfig;
pub use error::{Result, SessionwardError};
pub use http::{AuthorizedClient, HttpClient, HttpRequest, HttpResponse};
pub use navigation::{NavigationDecision, NavigationGuard, Route, RouteMeta, Router};
pub use session::{SessionController, SessionControllerBuilder, SessionStatus};
pub use storage::StorageAdapter;
pub use token_store::{Session, TokenStore};

#[cfg(test)]
pub mod test_utils;
