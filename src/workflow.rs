//! Named runner handle with automatic metrics and trace collection.

use crate::context::{FlowContext, RunProbe};
use crate::events::Runner;
use crate::metrics::FlowMetrics;
use crate::operation::{Apply, Operation};
use crate::serial::{run_serial, IntoSteps};
use crate::{parallel, Result};

/// Runs the three runners under a name, recording every run into a [`FlowContext`].
///
/// The free functions [`serial`](crate::serial), [`parallel`](crate::parallel),
/// [`parallel_map`](crate::parallel_map) and [`map`](crate::map) only log
/// through `tracing`. A `Flow` additionally records [`FlowMetrics`] and
/// timestamped events.
///
/// # Example
///
/// ```rust
/// use async_flow::{operation, Flow};
///
/// let flow = Flow::new().with_name("squares");
/// let square = operation::apply(|x: i32, done| done.succeed(x * x));
/// flow.map(vec![1, 2, 3], square, |result| {
///     assert_eq!(result.unwrap(), vec![1, 4, 9]);
/// });
///
/// let metrics = flow.metrics();
/// assert_eq!(metrics.units_launched, 3);
/// assert_eq!(metrics.runs_succeeded, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Flow {
    ctx: FlowContext,
    name: String,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow {
    /// Create a flow with a fresh context.
    pub fn new() -> Self {
        Self {
            ctx: FlowContext::new(),
            name: "flow".to_string(),
        }
    }

    /// Set a human-readable name used in traces and logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Record into `ctx` instead of a private context.
    ///
    /// Useful to aggregate metrics from several flows.
    pub fn with_context(mut self, ctx: FlowContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Returns the name of this flow.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access the context runs are recorded into.
    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Snapshot of the metrics recorded so far.
    pub fn metrics(&self) -> FlowMetrics {
        self.ctx.snapshot()
    }

    /// Run [`serial`](crate::serial) under this flow.
    pub fn serial<S, T, F>(&self, steps: S, callback: F)
    where
        S: IntoSteps<Item = T>,
        T: Send + 'static,
        F: FnOnce(Result<Option<T>>) + Send + 'static,
    {
        run_serial(steps.into_steps(), Box::new(callback), self.probe(Runner::Serial));
    }

    /// Run [`parallel`](crate::parallel) under this flow.
    pub fn parallel<T, F>(&self, operations: Vec<Operation<T>>, callback: F)
    where
        T: Send + 'static,
        F: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        parallel::run_parallel(operations, Box::new(callback), self.probe(Runner::Parallel));
    }

    /// Run [`parallel_map`](crate::parallel_map) under this flow.
    pub fn parallel_map<V, T, F>(&self, values: Vec<V>, apply: Apply<V, T>, callback: F)
    where
        T: Send + 'static,
        F: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        parallel::run_apply(values, apply, Box::new(callback), self.probe(Runner::Parallel));
    }

    /// Run [`map`](crate::map) under this flow.
    pub fn map<V, T, F>(&self, values: Vec<V>, apply: Apply<V, T>, callback: F)
    where
        T: Send + 'static,
        F: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        parallel::run_apply(values, apply, Box::new(callback), self.probe(Runner::Map));
    }

    fn probe(&self, runner: Runner) -> RunProbe {
        RunProbe::attached(self.ctx.clone(), &self.name, runner)
    }
}
