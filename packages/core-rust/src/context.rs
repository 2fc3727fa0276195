//! Per-request logging context.
//!
//! A [`RequestContext`] holds the metadata of exactly one in-flight request,
//! keyed by [`ContextKey`]. It is owned by the request through a
//! [`SharedRequestContext`] handle, which is created when the request enters
//! the interceptor and cleared when it leaves. Code running inside
//! [`SharedRequestContext::scope`] can reach the handle through
//! [`SharedRequestContext::current`] without it being passed explicitly.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::masking::LoggedHeaders;

tokio::task_local! {
    static CURRENT: SharedRequestContext;
}

/// Stable keys of the logging context. [`ContextKey::as_str`] is the field
/// name log consumers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKey {
    TrackingId,
    RequestTimestamp,
    ClientIp,
    HttpMethod,
    ApiKey,
    ApiMethod,
    RequestUri,
    RequestHeaders,
    ResponseHeaders,
    ResponseStatus,
    ResponseTime,
    Exception,
}

impl ContextKey {
    pub const ALL: [ContextKey; 12] = [
        ContextKey::TrackingId,
        ContextKey::RequestTimestamp,
        ContextKey::ClientIp,
        ContextKey::HttpMethod,
        ContextKey::ApiKey,
        ContextKey::ApiMethod,
        ContextKey::RequestUri,
        ContextKey::RequestHeaders,
        ContextKey::ResponseHeaders,
        ContextKey::ResponseStatus,
        ContextKey::ResponseTime,
        ContextKey::Exception,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrackingId => "tracking_id",
            Self::RequestTimestamp => "request_timestamp",
            Self::ClientIp => "client_ip",
            Self::HttpMethod => "http_method",
            Self::ApiKey => "api_key",
            Self::ApiMethod => "api_method",
            Self::RequestUri => "request_uri",
            Self::RequestHeaders => "request_headers",
            Self::ResponseHeaders => "response_headers",
            Self::ResponseStatus => "response_status",
            Self::ResponseTime => "response_time",
            Self::Exception => "exception",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored in the logging context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Headers(LoggedHeaders),
}

impl ContextValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Headers(_) => None,
        }
    }

    #[must_use]
    pub fn as_headers(&self) -> Option<&LoggedHeaders> {
        match self {
            Self::Headers(headers) => Some(headers),
            Self::Text(_) => None,
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<LoggedHeaders> for ContextValue {
    fn from(value: LoggedHeaders) -> Self {
        Self::Headers(value)
    }
}

/// Logging context of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    entries: BTreeMap<ContextKey, ContextValue>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: ContextKey, value: impl Into<ContextValue>) {
        self.entries.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: ContextKey) -> Option<&ContextValue> {
        self.entries.get(&key)
    }

    /// Returns the value of `key` if it is stored as text.
    #[must_use]
    pub fn get_text(&self, key: ContextKey) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_text)
    }

    #[must_use]
    pub fn contains(&self, key: ContextKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn remove(&mut self, key: ContextKey) -> Option<ContextValue> {
        self.entries.remove(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in [`ContextKey`] declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ContextKey, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

impl Serialize for RequestContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// Handle to the [`RequestContext`] of one in-flight request.
///
/// Cloning is cheap; clones refer to the same context. A handle is never
/// shared between requests.
#[derive(Debug, Clone, Default)]
pub struct SharedRequestContext {
    inner: Arc<Mutex<RequestContext>>,
}

impl SharedRequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: ContextKey, value: impl Into<ContextValue>) {
        self.inner.lock().insert(key, value);
    }

    #[must_use]
    pub fn get_text(&self, key: ContextKey) -> Option<String> {
        self.inner.lock().get_text(key).map(str::to_string)
    }

    #[must_use]
    pub fn contains(&self, key: ContextKey) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> RequestContext {
        self.inner.lock().clone()
    }

    /// Runs `f` with the context locked.
    pub fn with<R>(&self, f: impl FnOnce(&RequestContext) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs `fut` with this handle installed as the current context.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Synchronous counterpart of [`SharedRequestContext::scope`].
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }

    /// The context of the request being processed by the current task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }
}
