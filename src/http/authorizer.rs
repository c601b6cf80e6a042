//! Bearer credential injection for outbound requests
//!
//! [`RequestAuthorizer`] is a request-side interceptor: just before dispatch
//! it reads the current access token from the [`TokenStore`] and, when one is
//! present, sets `Authorization: Bearer <token>`. The token is read at
//! dispatch time, never captured when the interceptor is registered, so a
//! rotated token is used by the very next request.
//!
//! [`AuthorizedClient`] wraps any [`HttpClient`] and runs its interceptors on
//! every request. It holds no response-side logic; retrying after a `401` is
//! done one layer up by
//! [`SessionController::send`](crate::session::SessionController::send).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::token_store::TokenStore;

/// Inserts an `Authorization: Bearer <token>` header into the given map.
///
/// Any existing `Authorization` header, in any letter case, is replaced.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use sessionward::http::inject_token;
///
/// let mut headers = HashMap::new();
/// inject_token(&mut headers, "my_access_token");
/// assert_eq!(
///     headers.get("Authorization"),
///     Some(&"Bearer my_access_token".to_string()),
/// );
/// ```
pub fn inject_token(headers: &mut HashMap<String, String>, token: &str) {
    headers.retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
}

/// Mutates a request just before it is dispatched.
pub trait RequestInterceptor: Send + Sync + std::fmt::Debug {
    /// Adjusts `request` in place.
    fn intercept(&self, request: &mut HttpRequest);
}

/// Attaches the current access token as a bearer credential.
#[derive(Debug, Clone)]
pub struct RequestAuthorizer {
    tokens: Arc<TokenStore>,
}

impl RequestAuthorizer {
    /// Creates an authorizer reading from `tokens`.
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self { tokens }
    }
}

impl RequestInterceptor for RequestAuthorizer {
    fn intercept(&self, request: &mut HttpRequest) {
        if let Some(token) = self.tokens.token() {
            inject_token(&mut request.headers, &token);
        }
    }
}

/// An [`HttpClient`] that runs request interceptors before delegating.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    inner: Arc<dyn HttpClient>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl AuthorizedClient {
    /// Wraps `inner` with no interceptors.
    pub fn new(inner: Arc<dyn HttpClient>) -> Self {
        Self {
            inner,
            interceptors: Vec::new(),
        }
    }

    /// Appends an interceptor; interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Applies every interceptor to `request`.
    pub fn prepare(&self, mut request: HttpRequest) -> HttpRequest {
        for interceptor in &self.interceptors {
            interceptor.intercept(&mut request);
        }
        request
    }
}

#[async_trait::async_trait]
impl HttpClient for AuthorizedClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self.prepare(request);
        self.inner.execute(request).await
    }
}
