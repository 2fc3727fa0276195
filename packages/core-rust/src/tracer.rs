//! Operation tracing: timing and error logging around business operations.
//!
//! Two independent wrappers, applied explicitly at call sites (or through
//! `tracklog_server::service::OperationTraceLayer`):
//!
//! - **timing** logs the operation name, its rendered arguments and the
//!   elapsed milliseconds. Only operations registered with
//!   [`OperationTracer::register`] are timed.
//! - **error logging** logs any failed operation at `error` level together
//!   with its arguments, then hands the error back untouched.
//!
//! Neither wrapper alters the value or error returned by the operation.

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::context::{ContextKey, SharedRequestContext};

/// Rendering of an absent argument.
pub const NULL_ARG: &str = "null";

/// Rendering of an argument whose `Display` impl reported an error.
pub const UNRENDERABLE_ARG: &str = "<unrenderable>";

/// Ordered, already rendered operation arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    rendered: Vec<String>,
}

impl ArgList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: &dyn fmt::Display) -> Self {
        self.rendered.push(render(value));
        self
    }

    /// Appends an optional argument; `None` renders as [`NULL_ARG`].
    #[must_use]
    pub fn opt(mut self, value: Option<&dyn fmt::Display>) -> Self {
        self.rendered
            .push(value.map_or_else(|| NULL_ARG.to_string(), render));
        self
    }

    pub fn push(&mut self, value: &dyn fmt::Display) {
        self.rendered.push(render(value));
    }

    /// Comma-joined rendering, as logged.
    #[must_use]
    pub fn joined(&self) -> String {
        self.rendered.join(",")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

impl fmt::Display for ArgList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl FromIterator<String> for ArgList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            rendered: iter.into_iter().collect(),
        }
    }
}

fn render(value: &dyn fmt::Display) -> String {
    let mut out = String::new();
    match write!(out, "{value}") {
        Ok(()) => out,
        Err(fmt::Error) => UNRENDERABLE_ARG.to_string(),
    }
}

fn current_tracking_id() -> Option<String> {
    SharedRequestContext::current().and_then(|ctx| ctx.get_text(ContextKey::TrackingId))
}

/// Applies the timing and error-logging wrappers.
///
/// Cloning is cheap; the registration set is shared and read-only once built.
#[derive(Debug, Clone, Default)]
pub struct OperationTracer {
    timed: Arc<HashSet<String>>,
}

impl OperationTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as a timed operation.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.timed).insert(name.into());
        self
    }

    #[must_use]
    pub fn is_timed(&self, name: &str) -> bool {
        self.timed.contains(name)
    }

    /// Runs `f`, logging its duration when `name` is registered.
    pub fn time<T>(&self, name: &str, args: &ArgList, f: impl FnOnce() -> T) -> T {
        if !self.is_timed(name) {
            return f();
        }
        let start = Instant::now();
        let output = f();
        log_timing(name, args, start);
        output
    }

    /// Async counterpart of [`OperationTracer::time`].
    pub async fn time_async<F: Future>(&self, name: &str, args: &ArgList, fut: F) -> F::Output {
        if !self.is_timed(name) {
            return fut.await;
        }
        let start = Instant::now();
        let output = fut.await;
        log_timing(name, args, start);
        output
    }

    /// Runs `f` and logs its error, if any. The error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns.
    pub fn log_errors<T, E: fmt::Display>(
        &self,
        name: &str,
        args: &ArgList,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        f().inspect_err(|err| log_failure(name, args, err))
    }

    /// Async counterpart of [`OperationTracer::log_errors`].
    ///
    /// # Errors
    ///
    /// Returns whatever error `fut` resolves to.
    pub async fn log_errors_async<T, E, F>(&self, name: &str, args: &ArgList, fut: F) -> Result<T, E>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        fut.await.inspect_err(|err| log_failure(name, args, err))
    }

    /// Error logging around timing.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns.
    pub fn trace<T, E: fmt::Display>(
        &self,
        name: &str,
        args: &ArgList,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.log_errors(name, args, || self.time(name, args, f))
    }

    /// Async counterpart of [`OperationTracer::trace`].
    ///
    /// # Errors
    ///
    /// Returns whatever error `fut` resolves to.
    pub async fn trace_async<T, E, F>(&self, name: &str, args: &ArgList, fut: F) -> Result<T, E>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        self.log_errors_async(name, args, self.time_async(name, args, fut))
            .await
    }
}

fn log_timing(name: &str, args: &ArgList, start: Instant) {
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        operation = name,
        args = %args,
        elapsed_ms = elapsed_ms,
        tracking_id = current_tracking_id().as_deref().unwrap_or(""),
        "{name} with parameters [{args}] executed in {elapsed_ms} ms"
    );
}

fn log_failure(name: &str, args: &ArgList, err: &dyn fmt::Display) {
    tracing::error!(
        operation = name,
        args = %args,
        error = %err,
        tracking_id = current_tracking_id().as_deref().unwrap_or(""),
        "operation {name} failed with parameters [{args}]"
    );
}
