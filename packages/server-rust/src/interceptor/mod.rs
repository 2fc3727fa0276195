//! Request-logging interceptor.
//!
//! [`RequestLogLayer`] wraps an HTTP service so that every request gets its
//! own logging context, a correlation id echoed on the response, and a
//! guaranteed teardown. See [`layer`] for the per-request steps.

pub mod config;
pub mod extract;
pub mod layer;
mod scope;

pub use config::{ConfigError, RequestLogConfig, DEFAULT_API_KEY_PARAM};
pub use layer::{RequestLogLayer, RequestLogService};
pub use scope::INCOMPLETE_NOTE;

/// Name of the business operation a request maps to.
///
/// Stages ahead of the interceptor insert it as a request extension; the
/// interceptor records it as `api_method` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationName(String);

impl OperationName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Request start time in milliseconds since Unix epoch, as read from the
/// configured clock. Inserted as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestStart(pub u64);
