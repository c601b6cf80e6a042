//! Configuration management for Sessionward
//!
//! This module handles loading, parsing, and validating the session
//! configuration from YAML files and environment variables. Injected
//! collaborators (HTTP client, router, storage override) are not part of this
//! record; they are supplied through
//! [`SessionControllerBuilder`](crate::session::SessionControllerBuilder).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionwardError};

/// Session configuration
///
/// Every field has a default, so an empty YAML document (or
/// `SessionConfig::default()`) yields a usable configuration.
///
/// # Examples
///
/// ```
/// use sessionward::config::{SessionConfig, StorageKind};
///
/// let config = SessionConfig::default();
/// assert_eq!(config.token_key, "jwt_token");
/// assert_eq!(config.storage, StorageKind::Session);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage key for the access token
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Storage key for the refresh token
    #[serde(default = "default_refresh_token_key")]
    pub refresh_token_key: String,

    /// Login endpoint settings
    #[serde(default = "default_login_endpoint")]
    pub login: EndpointConfig,

    /// Refresh endpoint URL
    #[serde(default = "default_refresh_url")]
    pub refresh_url: String,

    /// Dotted path of the useful payload in the refresh response
    #[serde(default)]
    pub refresh_data_key: Option<String>,

    /// Profile endpoint settings
    #[serde(default = "default_profile_endpoint")]
    pub profile: EndpointConfig,

    /// Route to navigate to after login when no pending redirect exists
    #[serde(default = "default_redirect")]
    pub default_redirect: String,

    /// Track and use refresh tokens
    #[serde(default)]
    pub use_refresh_token: bool,

    /// Dotted path of the access token inside the (data-key extracted) payload
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Dotted path of the refresh token inside the (data-key extracted) payload
    #[serde(default = "default_refresh_token_path")]
    pub refresh_token_path: String,

    /// JSON field carrying the refresh token in the refresh request body
    #[serde(default = "default_refresh_body_key")]
    pub refresh_body_key: String,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageKind,

    /// File used by `local` storage; defaults to the platform data directory
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Keyring service name used by `keyring` storage
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Base URL for the default HTTP client
    #[serde(default)]
    pub api_url: Option<String>,

    /// Per-request timeout for the default HTTP client (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// An endpoint URL plus the dotted path of the useful payload in its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint URL, absolute or relative to `api_url`
    pub url: String,

    /// Dotted path into the response body; `None` uses the body as-is
    #[serde(default)]
    pub data_key: Option<String>,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Persistent file-backed storage
    Local,
    /// In-memory storage scoped to the process
    #[default]
    Session,
    /// Cookie-string storage
    Cookie,
    /// OS credential store
    Keyring,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Session => "session",
            Self::Cookie => "cookie",
            Self::Keyring => "keyring",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageKind {
    type Err = SessionwardError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "session" => Ok(Self::Session),
            "cookie" => Ok(Self::Cookie),
            "keyring" => Ok(Self::Keyring),
            other => Err(SessionwardError::Config(format!(
                "Invalid storage kind: {}. Must be one of: local, session, cookie, keyring",
                other
            ))),
        }
    }
}

fn default_token_key() -> String {
    "jwt_token".to_string()
}

fn default_refresh_token_key() -> String {
    "refresh_token".to_string()
}

fn default_login_endpoint() -> EndpointConfig {
    EndpointConfig {
        url: "/api/login".to_string(),
        data_key: None,
    }
}

fn default_refresh_url() -> String {
    "/api/refresh".to_string()
}

fn default_profile_endpoint() -> EndpointConfig {
    EndpointConfig {
        url: "/api/me".to_string(),
        data_key: None,
    }
}

fn default_redirect() -> String {
    "/dashboard".to_string()
}

fn default_token_path() -> String {
    "token".to_string()
}

fn default_refresh_token_path() -> String {
    "refresh_token".to_string()
}

fn default_refresh_body_key() -> String {
    "refresh_token".to_string()
}

fn default_keyring_service() -> String {
    "sessionward".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            refresh_token_key: default_refresh_token_key(),
            login: default_login_endpoint(),
            refresh_url: default_refresh_url(),
            refresh_data_key: None,
            profile: default_profile_endpoint(),
            default_redirect: default_redirect(),
            use_refresh_token: false,
            token_path: default_token_path(),
            refresh_token_path: default_refresh_token_path(),
            refresh_body_key: default_refresh_body_key(),
            storage: StorageKind::default(),
            storage_path: None,
            keyring_service: default_keyring_service(),
            api_url: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a YAML file, then apply environment overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SessionwardError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|e| SessionwardError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_url) = std::env::var("SESSIONWARD_API_URL") {
            self.api_url = Some(api_url);
        }

        if let Ok(storage) = std::env::var("SESSIONWARD_STORAGE") {
            match storage.parse::<StorageKind>() {
                Ok(kind) => self.storage = kind,
                Err(e) => tracing::warn!("Ignoring SESSIONWARD_STORAGE: {}", e),
            }
        }

        if let Ok(value) = std::env::var("SESSIONWARD_USE_REFRESH_TOKEN") {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.use_refresh_token = true,
                "0" | "false" | "no" => self.use_refresh_token = false,
                other => tracing::warn!("Ignoring SESSIONWARD_USE_REFRESH_TOKEN={}", other),
            }
        }

        if let Ok(redirect) = std::env::var("SESSIONWARD_DEFAULT_REDIRECT") {
            self.default_redirect = redirect;
        }

        if let Ok(path) = std::env::var("SESSIONWARD_STORAGE_PATH") {
            self.storage_path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`SessionwardError::Config`] describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.token_key.is_empty() {
            return Err(SessionwardError::Config("token_key cannot be empty".to_string()).into());
        }

        if self.use_refresh_token {
            if self.refresh_token_key.is_empty() {
                return Err(SessionwardError::Config(
                    "refresh_token_key cannot be empty".to_string(),
                )
                .into());
            }
            if self.refresh_token_key == self.token_key {
                return Err(SessionwardError::Config(
                    "token_key and refresh_token_key must differ".to_string(),
                )
                .into());
            }
            if self.refresh_url.is_empty() {
                return Err(
                    SessionwardError::Config("refresh_url cannot be empty".to_string()).into(),
                );
            }
        }

        if self.login.url.is_empty() {
            return Err(SessionwardError::Config("login.url cannot be empty".to_string()).into());
        }

        if self.profile.url.is_empty() {
            return Err(
                SessionwardError::Config("profile.url cannot be empty".to_string()).into(),
            );
        }

        if !self.default_redirect.starts_with('/') {
            return Err(SessionwardError::Config(format!(
                "default_redirect must be an absolute route path, got '{}'",
                self.default_redirect
            ))
            .into());
        }

        if self.request_timeout_seconds == 0 {
            return Err(SessionwardError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if let Some(api_url) = &self.api_url {
            url::Url::parse(api_url).map_err(|e| {
                SessionwardError::Config(format!("Invalid api_url '{}': {}", api_url, e))
            })?;
        }

        Ok(())
    }
}
