//! HTTP client abstraction
//!
//! The session core never talks to the network directly. It goes through the
//! [`HttpClient`] trait, which an application may implement over its own
//! transport. [`ReqwestClient`] is the default implementation, resolving
//! relative URLs by appending them to a configured base URL, path included.
//!
//! Clients report transport failures as errors and hand back every response,
//! whatever its status; deciding what a non-2xx status means is left to the
//! caller ([`HttpResponse::into_result`]).

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::{Result, SessionwardError};

pub mod authorizer;

pub use authorizer::{inject_token, AuthorizedClient, RequestAuthorizer, RequestInterceptor};

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outbound request, before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Request method
    pub method: Method,
    /// Absolute URL, or a path relative to the client's base URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a `POST` request with a JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    /// Sets a header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as returned by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Body parsed as JSON; non-JSON text becomes a JSON string and an empty
    /// body becomes `null`
    pub body: Value,
}

impl HttpResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body for a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`SessionwardError::HttpStatus`] for any other status.
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            return Ok(self.body);
        }
        let body = match self.body {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Err(SessionwardError::HttpStatus {
            status: self.status,
            body,
        }
        .into())
    }
}

/// Transport capability used by the session core.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// Dispatches `request` and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures (connection, DNS,
    /// timeout, unresolvable URL).
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default [`HttpClient`] over `reqwest`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sessionward::http::ReqwestClient;
///
/// let client = ReqwestClient::new(Some("https://api.example.com"), Duration::from_secs(30));
/// assert!(client.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    base_url: Option<url::Url>,
}

impl ReqwestClient {
    /// Creates a client with an optional base URL and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionwardError::Config`] if `base_url` is not a valid URL,
    /// or an HTTP error if the underlying client cannot be built.
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url
            .map(|raw| {
                url::Url::parse(raw).map_err(|e| {
                    SessionwardError::Config(format!("Invalid base URL '{}': {}", raw, e))
                })
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sessionward/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SessionwardError::Http)?;

        Ok(Self { client, base_url })
    }

    fn resolve(&self, raw: &str) -> Result<url::Url> {
        match url::Url::parse(raw) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    SessionwardError::Config(format!(
                        "Relative URL '{}' requires api_url to be configured",
                        raw
                    ))
                })?;
                let joined = format!(
                    "{}/{}",
                    base.as_str().trim_end_matches('/'),
                    raw.trim_start_matches('/')
                );
                url::Url::parse(&joined).map_err(|e| {
                    SessionwardError::Config(format!("Cannot resolve '{}': {}", raw, e)).into()
                })
            }
            Err(e) => Err(SessionwardError::Config(format!("Invalid URL '{}': {}", raw, e)).into()),
        }
    }
}

/// Parses a response body: JSON when possible, otherwise the raw text.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.resolve(&request.url)?;
        tracing::debug!(method = ?request.method, %url, "Dispatching request");

        let mut builder = self.client.request(request.method.into(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(SessionwardError::Http)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(SessionwardError::Http)?;

        Ok(HttpResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}
