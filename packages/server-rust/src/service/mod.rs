//! Traced business operations.
//!
//! 1. **Operations** (`operation`): typed calls implementing [`TracedCall`]
//! 2. **Middleware** (`middleware`): the operation-tracing tower layer
//! 3. **Domain service** (`orders`): the in-memory order service
//! 4. **Pipeline** (`pipeline`): composes the layer over the service

pub mod middleware;
pub mod operation;
pub mod orders;
pub mod pipeline;

pub use middleware::{OperationTraceLayer, OperationTraceService};
pub use operation::{
    operation_names, OperationError, Order, OrderOperation, OrderResponse, TracedCall,
};
pub use orders::OrderService;
pub use pipeline::{build_order_pipeline, default_tracer};
