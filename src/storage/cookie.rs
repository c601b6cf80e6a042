//! Cookie-based storage
//!
//! When an asynchronous [`CookieApi`] is injected, every operation goes
//! through it. Otherwise the store falls back to a cookie string in the
//! `name=value; name2=value2` form of a `Cookie` request header, parsed
//! synchronously on each read. Values are percent-encoded in both modes.

use std::sync::{Arc, Mutex};

use crate::error::{Result, SessionwardError};
use crate::storage::StorageAdapter;

/// Attributes applied when a cookie is written through a [`CookieApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Cookie path
    pub path: String,
    /// `SameSite` policy
    pub same_site: String,
    /// Restrict the cookie to secure transports
    pub secure: bool,
    /// Lifetime in seconds; `None` makes a session cookie
    pub max_age: Option<u64>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            same_site: "Strict".to_string(),
            secure: true,
            max_age: None,
        }
    }
}

/// Asynchronous cookie store capability.
#[async_trait::async_trait]
pub trait CookieApi: Send + Sync + std::fmt::Debug {
    /// Returns the raw (still encoded) value of the named cookie.
    async fn get(&self, name: &str) -> Result<Option<String>>;

    /// Writes a cookie.
    async fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) -> Result<()>;

    /// Deletes a cookie. Deleting an absent cookie is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Cookie-backed key/value storage.
///
/// # Examples
///
/// ```
/// use sessionward::storage::{CookieStorage, StorageAdapter};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let storage = CookieStorage::from_header("theme=dark");
/// storage.set("jwt_token", "a b").await?;
/// assert_eq!(storage.cookie_header(), "theme=dark; jwt_token=a%20b");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CookieStorage {
    api: Option<Arc<dyn CookieApi>>,
    attributes: CookieAttributes,
    jar: Mutex<String>,
}

impl CookieStorage {
    /// Creates a store using the synchronous cookie-string fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fallback store seeded from a `Cookie` header value.
    pub fn from_header(header: &str) -> Self {
        Self {
            jar: Mutex::new(header.trim().to_string()),
            ..Self::default()
        }
    }

    /// Creates a store that delegates to an asynchronous cookie API.
    pub fn with_api(api: Arc<dyn CookieApi>) -> Self {
        Self {
            api: Some(api),
            ..Self::default()
        }
    }

    /// Replaces the attributes used for writes through the cookie API.
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Current fallback cookie string, suitable for a `Cookie` header.
    ///
    /// Always empty when an asynchronous cookie API is in use.
    pub fn cookie_header(&self) -> String {
        self.jar.lock().map(|jar| jar.clone()).unwrap_or_default()
    }

    fn with_jar<T>(&self, f: impl FnOnce(&mut String) -> T) -> Result<T> {
        let mut jar = self
            .jar
            .lock()
            .map_err(|_| SessionwardError::Storage("cookie jar lock poisoned".into()))?;
        Ok(f(&mut jar))
    }
}

/// Splits a cookie string into `(name, raw value)` pairs, skipping
/// malformed segments.
fn parse_cookie_string(jar: &str) -> Vec<(&str, &str)> {
    jar.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some((name, value.trim()))
            }
        })
        .collect()
}

fn write_cookie_string(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[async_trait::async_trait]
impl StorageAdapter for CookieStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(api) = &self.api {
            return Ok(api.get(key).await?.map(|raw| decode(&raw)));
        }

        self.with_jar(|jar| {
            parse_cookie_string(jar)
                .into_iter()
                .find(|(name, _)| *name == key)
                .map(|(_, raw)| decode(raw))
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let encoded = urlencoding::encode(value);
        if let Some(api) = &self.api {
            return api.set(key, &encoded, &self.attributes).await;
        }

        self.with_jar(|jar| {
            let mut pairs: Vec<(&str, &str)> = parse_cookie_string(jar)
                .into_iter()
                .filter(|(name, _)| *name != key)
                .collect();
            pairs.push((key, encoded.as_ref()));
            let updated = write_cookie_string(&pairs);
            *jar = updated;
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if let Some(api) = &self.api {
            return api.delete(key).await;
        }

        self.with_jar(|jar| {
            let pairs: Vec<(&str, &str)> = parse_cookie_string(jar)
                .into_iter()
                .filter(|(name, _)| *name != key)
                .collect();
            let updated = write_cookie_string(&pairs);
            *jar = updated;
        })
    }
}
