//! Network module with deferred startup lifecycle.
//!
//! `new()` captures configuration, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use tracklog_core::LogSink;

use super::config::NetworkConfig;
use super::handlers::{
    cancel_order_handler, get_order_handler, health_handler, liveness_handler,
    place_order_handler, AppState,
};
use super::middleware::build_http_layers;
use crate::interceptor::ConfigError;

/// Assembles the demo router with all routes and middleware.
///
/// Routes:
/// - `GET /health` -- uptime and the request's tracking id
/// - `GET /health/live` -- liveness probe
/// - `POST /orders` -- place an order
/// - `GET /orders/{id}` -- fetch an order
/// - `DELETE /orders/{id}` -- cancel an order
///
/// # Errors
///
/// Returns [`ConfigError`] when the request-log settings are invalid.
pub fn build_router(config: &NetworkConfig, sink: Arc<dyn LogSink>) -> Result<Router, ConfigError> {
    let layers = build_http_layers(config, sink)?;

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/orders", post(place_order_handler))
        .route(
            "/orders/{id}",
            get(get_order_handler).delete(cancel_order_handler),
        )
        .layer(layers)
        .with_state(AppState::new()))
}

/// Manages the demo HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    sink: Arc<dyn LogSink>,
    listener: Option<TcpListener>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            sink,
            listener: None,
        }
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves.
    ///
    /// Connections carry their peer address so the interceptor can record the
    /// client IP.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, the request-log settings
    /// are invalid, or the server hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = build_router(&self.config, self.sink)?;

        info!("Serving HTTP connections");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use tracklog_core::{ContextKey, LogEvent, RecordingSink, MASK_TOKEN};

    use super::*;

    fn router_with(sink: &Arc<RecordingSink>) -> Router {
        build_router(&NetworkConfig::default(), Arc::clone(sink) as Arc<dyn LogSink>)
            .expect("default config is valid")
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5555))));
        req
    }

    #[tokio::test]
    async fn health_echoes_supplied_tracking_id() {
        let sink = Arc::new(RecordingSink::new());
        let mut req = request("GET", "/health");
        req.headers_mut()
            .insert("x-tracking-id", "caller-1".parse().unwrap());

        let resp = router_with(&sink).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-tracking-id"], "caller-1");

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["tracking_id"], "caller-1");
    }

    #[tokio::test]
    async fn order_request_is_tagged_and_logged() {
        let sink = Arc::new(RecordingSink::new());
        let mut req = request("POST", "/orders?item=lamp&quantity=2&api_key=k-42");
        req.headers_mut()
            .insert("authorization", "Bearer secret".parse().unwrap());

        let resp = router_with(&sink).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let received = sink.last(LogEvent::RequestReceived).unwrap();
        assert_eq!(received.get_text(ContextKey::ApiMethod), Some("place_order"));
        assert_eq!(received.get_text(ContextKey::ApiKey), Some("k-42"));
        assert_eq!(received.get_text(ContextKey::ClientIp), Some("10.1.2.3"));
        assert_eq!(received.get_text(ContextKey::HttpMethod), Some("POST"));
        assert_eq!(
            received.get_text(ContextKey::RequestUri),
            Some("/orders?item=lamp&quantity=2&api_key=k-42")
        );
        let headers = received
            .get(ContextKey::RequestHeaders)
            .and_then(|v| v.as_headers())
            .unwrap();
        assert_eq!(
            headers.get("authorization"),
            Some(&tracklog_core::LoggedHeader::Scalar(MASK_TOKEN.to_string()))
        );

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::ResponseStatus), Some("201"));
        assert!(completed.contains(ContextKey::ResponseTime));
        assert!(!completed.contains(ContextKey::Exception));
    }

    #[tokio::test]
    async fn failed_operation_still_completes_request_log() {
        let sink = Arc::new(RecordingSink::new());
        let resp = router_with(&sink)
            .oneshot(request("GET", "/orders/404"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert_eq!(completed.get_text(ContextKey::ApiMethod), Some("get_order"));
        assert_eq!(completed.get_text(ContextKey::ResponseStatus), Some("404"));
    }

    #[tokio::test]
    async fn unrouted_request_has_no_operation_name() {
        let sink = Arc::new(RecordingSink::new());
        let resp = router_with(&sink)
            .oneshot(request("GET", "/health/live"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let completed = sink.last(LogEvent::RequestCompleted).unwrap();
        assert!(!completed.contains(ContextKey::ApiMethod));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = NetworkConfig::default();
        config.request_log.api_key_param = String::new();
        let result = build_router(&config, Arc::new(RecordingSink::new()));
        assert!(matches!(result, Err(ConfigError::EmptyApiKeyParam)));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let config = NetworkConfig {
            host: "127.0.0.1".to_string(),
            ..NetworkConfig::default()
        };
        let mut module = NetworkModule::new(config, Arc::new(RecordingSink::new()));
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let module = NetworkModule::new(NetworkConfig::default(), Arc::new(RecordingSink::new()));
        let result = module.serve(std::future::pending::<()>()).await;
        assert!(result.is_err());
    }
}
