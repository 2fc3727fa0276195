//! Operation tracing middleware.
//!
//! Applies the [`OperationTracer`] timing and error-logging wrappers to every
//! call that passes through a tower service, using [`TracedCall`] to learn the
//! operation name and arguments.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::{Layer, Service};
use tracklog_core::OperationTracer;

use crate::service::operation::TracedCall;

// ---------------------------------------------------------------------------
// OperationTraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that traces each call with an [`OperationTracer`].
#[derive(Debug, Clone, Default)]
pub struct OperationTraceLayer {
    tracer: OperationTracer,
}

impl OperationTraceLayer {
    #[must_use]
    pub fn new(tracer: OperationTracer) -> Self {
        Self { tracer }
    }
}

impl<S> Layer<S> for OperationTraceLayer {
    type Service = OperationTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OperationTraceService {
            inner,
            tracer: self.tracer.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// OperationTraceService
// ---------------------------------------------------------------------------

/// Service wrapper that logs duration (for registered operations) and errors.
#[derive(Debug, Clone)]
pub struct OperationTraceService<S> {
    inner: S,
    tracer: OperationTracer,
}

impl<S, R> Service<R> for OperationTraceService<S>
where
    R: TracedCall,
    S: Service<R> + Send,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: R) -> Self::Future {
        let name = call.operation_name().to_string();
        let args = call.args();
        let tracer = self.tracer.clone();
        let fut = self.inner.call(call);

        Box::pin(async move { tracer.trace_async(&name, &args, fut).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
