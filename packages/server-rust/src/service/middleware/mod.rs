//! Tower middleware layers for the operation pipeline.
//!
//! - [`trace`]: Operation timing and error logging

pub mod trace;

pub use trace::{OperationTraceLayer, OperationTraceService};
