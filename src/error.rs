//! Error types for Sessionward
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for the typed variants and `anyhow` for propagation.

use thiserror::Error;

/// Main error type for Sessionward operations
///
/// Typed variants travel inside [`anyhow::Error`]; callers that need to
/// branch on a specific failure recover it with `downcast_ref`.
#[derive(Error, Debug)]
pub enum SessionwardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Transport-level failure reported by an injected HTTP client
    #[error("Transport error: {0}")]
    Transport(String),

    /// The selected storage backend cannot be used in this environment
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A storage backend operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Router or navigation failures
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// An operation required an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl SessionwardError {
    /// Returns the HTTP status code when this error is a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for Sessionward operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
