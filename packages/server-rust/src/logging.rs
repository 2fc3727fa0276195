//! Tracing subscriber setup and the tracing-backed [`LogSink`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;
use tracklog_core::{ContextKey, LogEvent, LogSink, RequestContext};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,tracklog_server=debug,tracklog_core=debug";

/// Target of the lines written by [`TracingSink`].
pub const REQUEST_LOG_TARGET: &str = "tracklog::request";

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json().flatten_event(true))
            .try_init(),
    }
}

/// [`LogSink`] that writes one `tracing` event per lifecycle point.
///
/// Every textual context key becomes a field; the full context, headers
/// included, is attached as JSON under `context`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: LogEvent, ctx: &RequestContext) {
        let text = move |key: ContextKey| ctx.get_text(key).unwrap_or("");
        let context = match serde_json::to_string(ctx) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(error = %err, "unable to serialize request context");
                String::new()
            }
        };

        match event {
            LogEvent::RequestReceived => tracing::info!(
                target: REQUEST_LOG_TARGET,
                tracking_id = text(ContextKey::TrackingId),
                request_timestamp = text(ContextKey::RequestTimestamp),
                client_ip = text(ContextKey::ClientIp),
                http_method = text(ContextKey::HttpMethod),
                api_key = text(ContextKey::ApiKey),
                api_method = text(ContextKey::ApiMethod),
                request_uri = text(ContextKey::RequestUri),
                context = %context,
                "{}",
                event.as_str()
            ),
            LogEvent::RequestCompleted if ctx.contains(ContextKey::Exception) => tracing::warn!(
                target: REQUEST_LOG_TARGET,
                tracking_id = text(ContextKey::TrackingId),
                request_uri = text(ContextKey::RequestUri),
                response_status = text(ContextKey::ResponseStatus),
                response_time = text(ContextKey::ResponseTime),
                exception = text(ContextKey::Exception),
                context = %context,
                "{}",
                event.as_str()
            ),
            LogEvent::RequestCompleted => tracing::info!(
                target: REQUEST_LOG_TARGET,
                tracking_id = text(ContextKey::TrackingId),
                request_uri = text(ContextKey::RequestUri),
                response_status = text(ContextKey::ResponseStatus),
                response_time = text(ContextKey::ResponseTime),
                context = %context,
                "{}",
                event.as_str()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing_subscriber::fmt::MakeWriter;
    use tracklog_core::MaskingPolicy;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn emit_json(event: LogEvent, ctx: &RequestContext) -> serde_json::Value {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(out.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || TracingSink.emit(event, ctx));
        let bytes = out.0.lock().clone();
        let line = String::from_utf8(bytes).unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }

    fn sample_context() -> RequestContext {
        let mut ctx = RequestContext::new();
        ctx.insert(ContextKey::TrackingId, "trk-1");
        ctx.insert(ContextKey::HttpMethod, "GET");
        ctx.insert(ContextKey::RequestUri, "/x?a=1");
        ctx.insert(
            ContextKey::RequestHeaders,
            MaskingPolicy::new().snapshot([("cookie", "sid=1"), ("accept", "*/*")]),
        );
        ctx
    }

    #[test]
    fn received_line_carries_request_fields() {
        let line = emit_json(LogEvent::RequestReceived, &sample_context());
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["target"], REQUEST_LOG_TARGET);
        assert_eq!(line["message"], "request received");
        assert_eq!(line["tracking_id"], "trk-1");
        assert_eq!(line["request_uri"], "/x?a=1");

        let context: serde_json::Value =
            serde_json::from_str(line["context"].as_str().unwrap()).unwrap();
        assert_eq!(context["request_headers"]["cookie"], tracklog_core::MASK_TOKEN);
        assert_eq!(context["request_headers"]["accept"], "*/*");
    }

    #[test]
    fn completed_line_carries_outcome() {
        let mut ctx = sample_context();
        ctx.insert(ContextKey::ResponseStatus, "200");
        ctx.insert(ContextKey::ResponseTime, "12");
        let line = emit_json(LogEvent::RequestCompleted, &ctx);
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["message"], "request completed");
        assert_eq!(line["response_status"], "200");
        assert_eq!(line["response_time"], "12");
    }

    #[test]
    fn failed_request_is_logged_as_warning() {
        let mut ctx = sample_context();
        ctx.insert(ContextKey::ResponseTime, "3");
        ctx.insert(ContextKey::Exception, "timeout");
        let line = emit_json(LogEvent::RequestCompleted, &ctx);
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["exception"], "timeout");
    }

    #[test]
    fn default_log_format_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
