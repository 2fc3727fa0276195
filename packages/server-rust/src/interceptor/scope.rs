//! Teardown guard for one intercepted request.
//!
//! [`RequestScope`] is created before anything else happens to a request and
//! dropped when the request leaves the interceptor. Dropping it records the
//! response time, emits [`LogEvent::RequestCompleted`] and clears the
//! context. Because this lives in `Drop`, it runs on normal completion, on an
//! error from the inner service, when the future is cancelled, and when the
//! handler panics.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use tracklog_core::{
    ClockSource, ContextKey, LogEvent, LogSink, MaskingPolicy, SharedRequestContext,
};

use super::extract::header_snapshot;

/// Recorded as the exception when the request ended without an outcome.
pub const INCOMPLETE_NOTE: &str = "request did not complete: handler panicked or was cancelled";

pub(crate) struct RequestScope {
    ctx: SharedRequestContext,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn ClockSource>,
    start: u64,
}

impl RequestScope {
    pub(crate) fn begin(
        ctx: SharedRequestContext,
        sink: Arc<dyn LogSink>,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        ctx.clear();
        let start = clock.now();
        Self {
            ctx,
            sink,
            clock,
            start,
        }
    }

    pub(crate) fn start(&self) -> u64 {
        self.start
    }

    pub(crate) fn record_response(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        policy: &MaskingPolicy,
    ) {
        self.ctx
            .insert(ContextKey::ResponseStatus, status.as_u16().to_string());
        self.ctx
            .insert(ContextKey::ResponseHeaders, header_snapshot(policy, headers));
    }

    pub(crate) fn record_error(&self, err: &dyn fmt::Display) {
        self.ctx.insert(ContextKey::Exception, err.to_string());
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.ctx.contains(ContextKey::ResponseStatus) && !self.ctx.contains(ContextKey::Exception)
        {
            self.ctx.insert(ContextKey::Exception, INCOMPLETE_NOTE);
        }
        let elapsed = self.clock.now().saturating_sub(self.start);
        self.ctx.insert(ContextKey::ResponseTime, elapsed.to_string());

        let snapshot = self.ctx.snapshot();
        self.sink.emit(LogEvent::RequestCompleted, &snapshot);
        self.ctx.clear();
    }
}

#[cfg(test)]
mod tests {
    use tracklog_core::{ManualClock, RecordingSink};

    use super::*;

    fn scope(sink: &Arc<RecordingSink>, clock: &Arc<ManualClock>) -> (RequestScope, SharedRequestContext) {
        let ctx = SharedRequestContext::new();
        let scope = RequestScope::begin(ctx.clone(), sink.clone(), clock.clone());
        (scope, ctx)
    }

    #[test]
    fn begin_clears_residual_state() {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(0));
        let ctx = SharedRequestContext::new();
        ctx.insert(ContextKey::ApiKey, "stale");

        let scope = RequestScope::begin(ctx.clone(), sink, clock);
        assert!(ctx.is_empty());
        drop(scope);
    }

    #[test]
    fn drop_records_outcome_emits_once_and_clears() {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(500));
        let (scope, ctx) = scope(&sink, &clock);
        assert_eq!(scope.start(), 500);

        clock.advance(40);
        scope.record_response(StatusCode::CREATED, &HeaderMap::new(), &MaskingPolicy::new());
        drop(scope);

        assert_eq!(sink.len(), 1);
        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::ResponseStatus), Some("201"));
        assert_eq!(completed.get_text(ContextKey::ResponseTime), Some("40"));
        assert!(!completed.contains(ContextKey::Exception));
        assert!(ctx.is_empty());
    }

    #[test]
    fn error_is_recorded_without_status() {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(0));
        let (scope, _ctx) = scope(&sink, &clock);

        scope.record_error(&"db unavailable");
        drop(scope);

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::Exception), Some("db unavailable"));
        assert_eq!(completed.get_text(ContextKey::ResponseTime), Some("0"));
        assert!(!completed.contains(ContextKey::ResponseStatus));
    }

    #[test]
    fn abandoned_scope_notes_incomplete_request() {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(0));
        let (scope, ctx) = scope(&sink, &clock);
        drop(scope);

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::Exception), Some(INCOMPLETE_NOTE));
        assert!(completed.contains(ContextKey::ResponseTime));
        assert!(ctx.is_empty());
    }

    #[test]
    fn clock_going_backwards_gives_zero_elapsed() {
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let (scope, _ctx) = scope(&sink, &clock);
        clock.set(10);
        drop(scope);

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::ResponseTime), Some("0"));
    }
}
