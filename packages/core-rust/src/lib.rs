//! `tracklog` core: per-request logging context, header masking,
//! correlation ids, and operation tracing.

pub mod clock;
pub mod context;
pub mod correlation;
pub mod masking;
pub mod sink;
pub mod tracer;
pub mod traits;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use context::{ContextKey, ContextValue, RequestContext, SharedRequestContext};
pub use correlation::{CorrelationId, DEFAULT_TRACKING_HEADER};
pub use masking::{
    HeaderClass, LoggedHeader, LoggedHeaders, MaskingPolicy, MANDATORY_MASKED_HEADERS, MASK_TOKEN,
};
pub use sink::RecordingSink;
pub use tracer::{ArgList, OperationTracer, NULL_ARG, UNRENDERABLE_ARG};
pub use traits::{LogEvent, LogSink};
