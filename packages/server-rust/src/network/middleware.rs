//! HTTP middleware stack for the demo server.
//!
//! Middleware ordering follows the outer-to-inner convention: the first
//! layer listed is the outermost (processes the request first on the way
//! in, and the response last on the way out).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Method, Request, StatusCode};
use tower::layer::util::{Identity, Stack};
use tower::util::MapRequestLayer;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracklog_core::LogSink;

use super::config::NetworkConfig;
use crate::interceptor::{ConfigError, OperationName, RequestLogLayer};
use crate::service::operation_names;

type TagOperation = fn(Request<Body>) -> Request<Body>;

/// The composed Tower layer type produced by [`build_http_layers`].
type HttpLayers = Stack<
    TimeoutLayer,
    Stack<RequestLogLayer, Stack<MapRequestLayer<TagOperation>, Identity>>,
>;

/// Builds the HTTP-level Tower middleware stack from the network configuration.
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `TagOperation` -- names the business operation of the matched route
/// 2. `RequestLog` -- logging context, correlation id, request/response events
/// 3. `Timeout` -- answers `408` when the handler exceeds the request timeout
///
/// The stack must be applied with `Router::layer` so the matched route is
/// known when the operation is tagged.
///
/// # Errors
///
/// Returns [`ConfigError`] when the request-log settings are invalid.
pub fn build_http_layers(
    config: &NetworkConfig,
    sink: Arc<dyn LogSink>,
) -> Result<HttpLayers, ConfigError> {
    let request_log = RequestLogLayer::try_new(config.request_log.clone(), sink)?;

    Ok(ServiceBuilder::new()
        .layer(MapRequestLayer::new(tag_operation as TagOperation))
        .layer(request_log)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .into_inner())
}

/// Operation name of a route, if it maps to one.
#[must_use]
pub fn operation_for(method: &Method, route: &str) -> Option<&'static str> {
    match (method, route) {
        (&Method::GET, "/orders/{id}") => Some(operation_names::GET_ORDER),
        (&Method::POST, "/orders") => Some(operation_names::PLACE_ORDER),
        (&Method::DELETE, "/orders/{id}") => Some(operation_names::CANCEL_ORDER),
        _ => None,
    }
}

fn tag_operation(mut req: Request<Body>) -> Request<Body> {
    let name = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|route| operation_for(req.method(), route.as_str()));
    if let Some(name) = name {
        req.extensions_mut().insert(OperationName::new(name));
    }
    req
}
