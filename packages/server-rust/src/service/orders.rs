//! In-memory order service used by the demo server.

use std::collections::BTreeMap;
use std::future::{ready, Ready};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tower::Service;

use super::operation::{Order, OperationError, OrderOperation, OrderResponse};

/// Order store shared by all clones of the service.
#[derive(Debug, Clone, Default)]
pub struct OrderService {
    orders: Arc<Mutex<BTreeMap<u64, Order>>>,
    next_id: Arc<AtomicU64>,
}

impl OrderService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn execute(&self, op: OrderOperation) -> Result<OrderResponse, OperationError> {
        match op {
            OrderOperation::Get { order_id } => self
                .orders
                .lock()
                .get(&order_id)
                .cloned()
                .map(OrderResponse::Order)
                .ok_or(OperationError::NotFound { order_id }),
            OrderOperation::Place {
                item,
                quantity,
                coupon,
            } => {
                if quantity == 0 {
                    return Err(OperationError::InvalidQuantity);
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let order = Order {
                    id,
                    item,
                    quantity,
                    coupon,
                };
                self.orders.lock().insert(id, order.clone());
                Ok(OrderResponse::Order(order))
            }
            OrderOperation::Cancel { order_id } => self
                .orders
                .lock()
                .remove(&order_id)
                .map(|_| OrderResponse::Cancelled { order_id })
                .ok_or(OperationError::NotFound { order_id }),
        }
    }
}

impl Service<OrderOperation> for OrderService {
    type Response = OrderResponse;
    type Error = OperationError;
    type Future = Ready<Result<OrderResponse, OperationError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: OrderOperation) -> Self::Future {
        ready(self.execute(op))
    }
}
