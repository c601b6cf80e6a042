//! Test utilities for Sessionward
//!
//! In-process doubles for the three injected capabilities: storage, HTTP
//! transport, and router. Each records what it was asked to do so tests can
//! assert on the exact interaction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Result, SessionwardError};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::navigation::{NavigationDecision, NavigationHook, Route, Router};
use crate::storage::StorageAdapter;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// A storage operation observed by [`RecordingStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Get(String),
    Set(String, String),
    Remove(String),
}

/// In-memory storage that records every call.
#[derive(Debug, Default)]
pub struct RecordingStorage {
    values: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<StorageCall>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value without recording a call.
    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl StorageAdapter for RecordingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Get(key.to_string()));
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Set(key.to_string(), value.to_string()));
        self.seed(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Remove(key.to_string()));
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Storage whose every operation fails as unavailable.
#[derive(Debug)]
pub struct UnavailableStorage;

#[async_trait::async_trait]
impl StorageAdapter for UnavailableStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(SessionwardError::StorageUnavailable("disabled for test".to_string()).into())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(SessionwardError::StorageUnavailable("disabled for test".to_string()).into())
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(SessionwardError::StorageUnavailable("disabled for test".to_string()).into())
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Scripted {
    Response(HttpResponse),
    DelayedResponse(HttpResponse, Duration),
    TransportError(String),
}

/// HTTP client that replays queued outcomes in order and records requests.
///
/// Requests beyond the script receive a `404`.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(response));
    }

    /// Queues a response that is only delivered after `delay`, regardless of
    /// the client-wide delay.
    pub fn push_delayed_response(&self, response: HttpResponse, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::DelayedResponse(response, delay));
    }

    pub fn push_transport_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::TransportError(message.to_string()));
    }

    /// Makes every request wait `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        let delay = match &next {
            Some(Scripted::DelayedResponse(_, delay)) => Some(*delay),
            _ => *self.delay.lock().unwrap(),
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Scripted::Response(response)) | Some(Scripted::DelayedResponse(response, _)) => {
                Ok(response)
            }
            Some(Scripted::TransportError(message)) => {
                Err(SessionwardError::Transport(message).into())
            }
            None => Ok(HttpResponse::new(404, serde_json::Value::Null)),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Router that records navigations and keeps the registered hook.
#[derive(Default)]
pub struct FakeRouter {
    navigations: Mutex<Vec<String>>,
    hook: Mutex<Option<Arc<dyn NavigationHook>>>,
    fail: bool,
}

impl std::fmt::Debug for FakeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeRouter")
            .field("navigations", &self.navigations)
            .field("fail", &self.fail)
            .finish()
    }
}

impl FakeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A router whose `navigate` always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn has_hook(&self) -> bool {
        self.hook.lock().unwrap().is_some()
    }

    /// Runs the registered hook for a transition to `to`.
    pub async fn visit(&self, to: &Route) -> NavigationDecision {
        let hook = self.hook.lock().unwrap().clone();
        match hook {
            Some(hook) => hook.before_navigate(to, None).await,
            None => NavigationDecision::Allow,
        }
    }
}

#[async_trait::async_trait]
impl Router for FakeRouter {
    async fn navigate(&self, path: &str) -> Result<()> {
        if self.fail {
            return Err(SessionwardError::Navigation(format!("cannot reach {}", path)).into());
        }
        self.navigations.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn before_each(&self, hook: Arc<dyn NavigationHook>) {
        *self.hook.lock().unwrap() = Some(hook);
    }
}
