//! Demo HTTP server: configuration, routes, middleware stack and lifecycle.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;

pub use config::NetworkConfig;
pub use handlers::AppState;
pub use middleware::build_http_layers;
pub use module::{build_router, NetworkModule};
