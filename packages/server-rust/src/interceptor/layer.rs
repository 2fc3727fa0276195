//! Tower layer that wraps each HTTP request with a logging context.
//!
//! **Per-request steps:**
//! 1. Open a [`RequestScope`] over a fresh, cleared context and read the start time
//! 2. Resolve the correlation id and prepare the encoded response header
//! 3. Record request metadata and the masked request headers
//! 4. Emit `request received`, then run the inner service with the context
//!    installed as the task's current context
//! 5. Record the response status and headers, or the inner error
//!
//! Dropping the scope records the response time, emits `request completed`
//! and clears the context, whichever way step 4 ends.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};
use tracklog_core::{ContextKey, CorrelationId, LogEvent, LogSink, SharedRequestContext};

use super::config::{ConfigError, RequestLogConfig, Settings};
use super::extract;
use super::scope::RequestScope;
use super::RequestStart;

// ---------------------------------------------------------------------------
// RequestLogLayer
// ---------------------------------------------------------------------------

/// Tower layer that gives every request a logging context and correlation id.
#[derive(Clone)]
pub struct RequestLogLayer {
    shared: Arc<Shared>,
}

struct Shared {
    settings: Settings,
    sink: Arc<dyn LogSink>,
}

impl RequestLogLayer {
    /// Layer with the default configuration.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::from_settings(Settings::default(), sink)
    }

    /// Layer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a configured header or parameter name is invalid.
    pub fn try_new(config: RequestLogConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        Ok(Self::from_settings(config.validate()?, sink))
    }

    fn from_settings(settings: Settings, sink: Arc<dyn LogSink>) -> Self {
        Self {
            shared: Arc::new(Shared { settings, sink }),
        }
    }
}

impl fmt::Debug for RequestLogLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogLayer")
            .field("tracking_header", &self.shared.settings.tracking_header)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            shared: Arc::clone(&self.shared),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestLogService
// ---------------------------------------------------------------------------

/// Service wrapper produced by [`RequestLogLayer`].
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S> fmt::Debug for RequestLogService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogService").finish_non_exhaustive()
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let shared = Arc::clone(&self.shared);
        let settings = &shared.settings;

        let ctx = SharedRequestContext::new();
        let scope = RequestScope::begin(
            ctx.clone(),
            Arc::clone(&shared.sink),
            Arc::clone(&settings.clock),
        );
        let start = scope.start();

        let tracking_id = CorrelationId::resolve(
            req.headers()
                .get(&settings.tracking_header)
                .and_then(|value| value.to_str().ok()),
        );
        ctx.insert(ContextKey::TrackingId, tracking_id.as_str());

        let echo = match HeaderValue::from_str(&tracking_id.encoded()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(
                    tracking_id = %tracking_id,
                    error = %err,
                    "unable to add tracking id to response header"
                );
                None
            }
        };

        ctx.insert(ContextKey::RequestTimestamp, start.to_string());
        ctx.insert(ContextKey::ClientIp, extract::client_ip(req.extensions()));
        ctx.insert(ContextKey::HttpMethod, req.method().as_str());
        ctx.insert(
            ContextKey::ApiKey,
            extract::api_key(req.uri(), &settings.api_key_param),
        );
        if let Some(name) = extract::operation_name(req.extensions()) {
            ctx.insert(ContextKey::ApiMethod, name);
        }
        ctx.insert(ContextKey::RequestUri, extract::request_uri(req.uri()));
        ctx.insert(
            ContextKey::RequestHeaders,
            extract::header_snapshot(&settings.policy, req.headers()),
        );

        let span = info_span!(
            "request",
            tracking_id = %tracking_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        req.extensions_mut().insert(ctx.clone());
        req.extensions_mut().insert(tracking_id);
        req.extensions_mut().insert(RequestStart(start));

        shared.sink.emit(LogEvent::RequestReceived, &ctx.snapshot());

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut result = ctx.scope(fut).await;
                match &mut result {
                    Ok(response) => {
                        if let Some(value) = echo {
                            response
                                .headers_mut()
                                .insert(shared.settings.tracking_header.clone(), value);
                        }
                        scope.record_response(
                            response.status(),
                            response.headers(),
                            &shared.settings.policy,
                        );
                    }
                    Err(err) => scope.record_error(&*err),
                }
                drop(scope);
                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
