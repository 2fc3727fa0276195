use crate::context::RequestContext;

/// Point in the request lifecycle at which the interceptor emits a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEvent {
    /// Request metadata has been populated; the handler has not run yet.
    RequestReceived,
    /// Outcome has been recorded; the context is cleared right after.
    RequestCompleted,
}

impl LogEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestReceived => "request received",
            Self::RequestCompleted => "request completed",
        }
    }
}

/// Structured log sink reading the current request context.
///
/// Implementations must not panic or block on I/O failures: the interceptor
/// calls `emit` from its teardown path.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: LogEvent, ctx: &RequestContext);
}
