//! Health and liveness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::json;
use tracklog_core::CorrelationId;

use super::AppState;

/// Returns uptime and the tracking id assigned to this request.
pub async fn health_handler(
    State(state): State<AppState>,
    Extension(tracking_id): Extension<CorrelationId>,
) -> Json<serde_json::Value> {
    Json(json!({
        "state": "ready",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "tracking_id": tracking_id.as_str(),
    }))
}

/// Liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_handler_reports_tracking_id() {
        let response = health_handler(
            State(AppState::new()),
            Extension(CorrelationId::new("trk-1")),
        )
        .await;
        let json = response.0;

        assert_eq!(json["state"], "ready");
        assert_eq!(json["tracking_id"], "trk-1");
        assert!(json["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn liveness_handler_always_returns_200() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }
}
