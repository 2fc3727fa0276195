//! Pipeline composition: wraps the order service with the tracing layer.

use tower::ServiceBuilder;
use tracklog_core::OperationTracer;

use super::middleware::{OperationTraceLayer, OperationTraceService};
use super::operation::operation_names;
use super::orders::OrderService;

/// Tracer with the order operations that are timed.
///
/// Reads are not timed; their failures are still logged.
#[must_use]
pub fn default_tracer() -> OperationTracer {
    OperationTracer::new()
        .register(operation_names::PLACE_ORDER)
        .register(operation_names::CANCEL_ORDER)
}

/// Build the order pipeline by wrapping the `OrderService` with the tracing layer.
///
/// The returned service implements `tower::Service<OrderOperation>` and is
/// cheap to clone.
#[must_use]
pub fn build_order_pipeline(
    service: OrderService,
    tracer: OperationTracer,
) -> OperationTraceService<OrderService> {
    ServiceBuilder::new()
        .layer(OperationTraceLayer::new(tracer))
        .service(service)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tower::ServiceExt;

    use super::*;
    use crate::service::operation::{OperationError, OrderOperation, OrderResponse};

    #[test]
    fn default_tracer_times_writes_only() {
        let tracer = default_tracer();
        assert!(tracer.is_timed("place_order"));
        assert!(tracer.is_timed("cancel_order"));
        assert!(!tracer.is_timed("get_order"));
    }

    #[tokio::test]
    async fn pipeline_routes_through_tracing_layer() {
        let svc = build_order_pipeline(OrderService::new(), default_tracer());

        let resp = svc
            .clone()
            .oneshot(OrderOperation::Place {
                item: "lamp".to_string(),
                quantity: 1,
                coupon: None,
            })
            .await
            .unwrap();
        assert!(matches!(resp, OrderResponse::Order(ref order) if order.item == "lamp"));

        let err = svc
            .oneshot(OrderOperation::Cancel { order_id: 99 })
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::NotFound { order_id: 99 }));
    }
}
