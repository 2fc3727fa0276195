//! In-memory [`LogSink`] that keeps a copy of every emitted context.

use parking_lot::Mutex;

use crate::context::RequestContext;
use crate::traits::{LogEvent, LogSink};

/// Sink recording `(event, context snapshot)` pairs in emission order.
///
/// Useful in tests and for embedders that forward entries elsewhere.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(LogEvent, RequestContext)>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<(LogEvent, RequestContext)> {
        self.records.lock().clone()
    }

    /// Snapshots emitted for `event`, oldest first.
    #[must_use]
    pub fn events(&self, event: LogEvent) -> Vec<RequestContext> {
        self.records
            .lock()
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, ctx)| ctx.clone())
            .collect()
    }

    /// Most recent snapshot emitted for `event`.
    #[must_use]
    pub fn last(&self, event: LogEvent) -> Option<RequestContext> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|(e, _)| *e == event)
            .map(|(_, ctx)| ctx.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, event: LogEvent, ctx: &RequestContext) {
        self.records.lock().push((event, ctx.clone()));
    }
}
