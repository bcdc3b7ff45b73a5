//! Execution context shared by the runs of a [`Flow`](crate::Flow).
//!
//! [`FlowContext`] accumulates [`FlowMetrics`] and a structured trace of
//! [`FlowEvent`]s. Runners report into it through a per-run probe, which also
//! emits `tracing` events whether or not a context is attached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::events::{FlowEvent, Runner, TraceEntry};
use crate::metrics::FlowMetrics;
use crate::{Error, Result};

/// Context that runs record metrics and trace events into.
///
/// Cloneable and thread-safe: clones share the same underlying storage, so
/// completions arriving from any thread update one view.
///
/// # Example
///
/// ```rust
/// use async_flow::{Flow, FlowContext, Steps};
///
/// let ctx = FlowContext::new();
/// let flow = Flow::new().with_name("noop").with_context(ctx.clone());
/// flow.serial(Steps::<i32>::empty(), |_| {});
///
/// assert_eq!(ctx.snapshot().runs_succeeded, 1);
/// assert_eq!(ctx.trace_snapshot().len(), 2); // RunStart + RunEnd
/// ```
#[derive(Debug, Clone)]
pub struct FlowContext {
    /// Shared metrics accumulator.
    pub metrics: Arc<Mutex<FlowMetrics>>,
    /// Shared trace log for structured flow events.
    pub traces: Arc<Mutex<Vec<TraceEntry>>>,
}

impl Default for FlowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowContext {
    /// Create a new context with empty metrics and traces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(FlowMetrics::default())),
            traces: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn metrics(&self) -> MutexGuard<'_, FlowMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn traces(&self) -> MutexGuard<'_, Vec<TraceEntry>> {
        self.traces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the shared metrics.
    pub fn update_metrics(&self, f: impl FnOnce(&mut FlowMetrics)) {
        f(&mut self.metrics());
    }

    /// Get a snapshot of the current metrics.
    #[must_use]
    pub fn snapshot(&self) -> FlowMetrics {
        self.metrics().clone()
    }

    /// Append a timestamped event to the trace log.
    pub fn emit(&self, event: FlowEvent) {
        let entry = TraceEntry::new(event);
        self.traces().push(entry);
    }

    /// Get a snapshot of the current trace log.
    #[must_use]
    pub fn trace_snapshot(&self) -> Vec<TraceEntry> {
        self.traces().clone()
    }

    /// Export the trace log as a JSON array.
    pub fn trace_json(&self) -> Result<String> {
        let entries = self.trace_snapshot();
        serde_json::to_string(&entries).map_err(Error::from)
    }

    /// Clear all trace entries.
    pub fn clear_traces(&self) {
        self.traces().clear();
    }
}

/// Per-run reporting hook handed to a runner.
#[derive(Debug, Clone)]
pub(crate) struct RunProbe {
    ctx: Option<FlowContext>,
    flow: Arc<str>,
    runner: Runner,
    started: Instant,
}

impl RunProbe {
    /// A probe that only logs through `tracing`.
    pub(crate) fn detached(runner: Runner) -> Self {
        Self {
            ctx: None,
            flow: Arc::from("anonymous"),
            runner,
            started: Instant::now(),
        }
    }

    pub(crate) fn attached(ctx: FlowContext, flow: &str, runner: Runner) -> Self {
        Self {
            ctx: Some(ctx),
            flow: Arc::from(flow),
            runner,
            started: Instant::now(),
        }
    }

    pub(crate) fn run_started(&self, units: usize) {
        tracing::debug!(flow = %self.flow, runner = %self.runner, units, "run started");
        if let Some(ctx) = &self.ctx {
            ctx.update_metrics(FlowMetrics::record_run_start);
            ctx.emit(FlowEvent::RunStart {
                flow: self.flow.to_string(),
                runner: self.runner,
                units,
            });
        }
    }

    pub(crate) fn launched(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.update_metrics(FlowMetrics::record_launch);
        }
    }

    pub(crate) fn completed(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.update_metrics(FlowMetrics::record_completion);
        }
    }

    pub(crate) fn failed(&self, index: usize, error: &Error) {
        tracing::debug!(flow = %self.flow, runner = %self.runner, index, %error, "unit failed");
        if let Some(ctx) = &self.ctx {
            ctx.emit(FlowEvent::UnitFailed {
                flow: self.flow.to_string(),
                runner: self.runner,
                index,
                message: error.to_string(),
            });
        }
    }

    pub(crate) fn discarded(&self, index: usize) {
        tracing::trace!(flow = %self.flow, runner = %self.runner, index, "late result discarded");
        if let Some(ctx) = &self.ctx {
            ctx.update_metrics(FlowMetrics::record_discard);
            ctx.emit(FlowEvent::ResultDiscarded {
                flow: self.flow.to_string(),
                runner: self.runner,
                index,
            });
        }
    }

    pub(crate) fn run_finished(&self, succeeded: bool) {
        let duration_ms = self.started.elapsed().as_millis();
        tracing::debug!(
            flow = %self.flow,
            runner = %self.runner,
            succeeded,
            duration_ms = duration_ms as u64,
            "run finished"
        );
        if let Some(ctx) = &self.ctx {
            ctx.update_metrics(|m| m.record_run_end(succeeded));
            ctx.emit(FlowEvent::RunEnd {
                flow: self.flow.to_string(),
                runner: self.runner,
                succeeded,
                duration_ms,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_records_into_context() {
        let ctx = FlowContext::new();
        let probe = RunProbe::attached(ctx.clone(), "t", Runner::Parallel);
        probe.run_started(2);
        probe.launched();
        probe.launched();
        probe.completed();
        probe.failed(1, &Error::from("bad"));
        probe.run_finished(false);
        probe.discarded(0);

        let m = ctx.snapshot();
        assert_eq!(m.runs_started, 1);
        assert_eq!(m.units_launched, 2);
        assert_eq!(m.units_completed, 1);
        assert_eq!(m.runs_failed, 1);
        assert_eq!(m.results_discarded, 1);
        assert_eq!(ctx.trace_snapshot().len(), 4);
    }

    #[test]
    fn test_detached_probe_records_nothing() {
        let probe = RunProbe::detached(Runner::Serial);
        probe.run_started(1);
        probe.run_finished(true);
    }

    #[test]
    fn test_trace_json_and_clear() {
        let ctx = FlowContext::new();
        RunProbe::attached(ctx.clone(), "t", Runner::Map).run_started(0);
        let json = ctx.trace_json().unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("RunStart"));
        ctx.clear_traces();
        assert!(ctx.trace_snapshot().is_empty());
    }
}
