//! HTTP handler definitions for the demo server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod orders;

pub use health::{health_handler, liveness_handler};
pub use orders::{cancel_order_handler, get_order_handler, place_order_handler, PlaceOrderParams};

use std::time::Instant;

use crate::service::{build_order_pipeline, default_tracer, OperationTraceService, OrderService};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: the order pipeline shares its store between clones.
#[derive(Clone)]
pub struct AppState {
    /// Traced order service.
    pub orders: OperationTraceService<OrderService>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: build_order_pipeline(OrderService::new(), default_tracer()),
            start_time: Instant::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
