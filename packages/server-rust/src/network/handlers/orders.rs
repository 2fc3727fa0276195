//! Order endpoint handlers.
//!
//! Each handler turns the HTTP request into an [`OrderOperation`] and sends it
//! through the traced order pipeline, so timing and failures are logged with
//! the tracking id of the request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;

use super::AppState;
use crate::service::{OperationError, Order, OrderOperation, OrderResponse};

/// Query parameters of `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderParams {
    pub item: String,
    pub quantity: u32,
    #[serde(default)]
    pub coupon: Option<String>,
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidQuantity => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn dispatch(state: AppState, op: OrderOperation) -> Result<OrderResponse, OperationError> {
    state.orders.oneshot(op).await
}

fn expect_order(response: OrderResponse) -> Result<Order, OperationError> {
    match response {
        OrderResponse::Order(order) => Ok(order),
        other => Err(anyhow::anyhow!("unexpected order response: {other:?}").into()),
    }
}

/// `GET /orders/{id}`
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Json<Order>, OperationError> {
    let response = dispatch(state, OrderOperation::Get { order_id }).await?;
    expect_order(response).map(Json)
}

/// `POST /orders?item=..&quantity=..[&coupon=..]`
pub async fn place_order_handler(
    State(state): State<AppState>,
    Query(params): Query<PlaceOrderParams>,
) -> Result<(StatusCode, Json<Order>), OperationError> {
    let op = OrderOperation::Place {
        item: params.item,
        quantity: params.quantity,
        coupon: params.coupon,
    };
    let order = expect_order(dispatch(state, op).await?)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `DELETE /orders/{id}`
pub async fn cancel_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<StatusCode, OperationError> {
    dispatch(state, OrderOperation::Cancel { order_id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(item: &str, quantity: u32) -> PlaceOrderParams {
        PlaceOrderParams {
            item: item.to_string(),
            quantity,
            coupon: None,
        }
    }

    #[tokio::test]
    async fn place_then_get_then_cancel() {
        let state = AppState::new();

        let (status, Json(order)) =
            place_order_handler(State(state.clone()), Query(params("desk", 1)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.item, "desk");

        let Json(fetched) = get_order_handler(State(state.clone()), Path(order.id))
            .await
            .unwrap();
        assert_eq!(fetched, order);

        let status = cancel_order_handler(State(state.clone()), Path(order.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = get_order_handler(State(state), Path(order.id)).await;
        assert!(matches!(missing, Err(OperationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let result = place_order_handler(State(AppState::new()), Query(params("desk", 0))).await;
        assert!(matches!(result, Err(OperationError::InvalidQuantity)));
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(
            OperationError::NotFound { order_id: 1 }.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            OperationError::InvalidQuantity.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OperationError::Internal(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
