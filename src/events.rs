//! Structured flow events for tracing and observability.
//!
//! Runners driven through a [`Flow`](crate::Flow) emit these events into its
//! [`FlowContext`](crate::FlowContext), giving a typed, serializable record of
//! every run instead of free-form log lines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which runner produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runner {
    /// [`serial`](crate::serial).
    Serial,
    /// [`parallel`](crate::parallel) and [`parallel_map`](crate::parallel_map).
    Parallel,
    /// [`map`](crate::map).
    Map,
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Runner::Serial => "serial",
            Runner::Parallel => "parallel",
            Runner::Map => "map",
        };
        f.write_str(name)
    }
}

/// Events that can be emitted while a runner executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum FlowEvent {
    /// A runner was invoked.
    RunStart {
        /// Name of the flow that owns the run.
        flow: String,
        /// The runner being executed.
        runner: Runner,
        /// Number of operations (or values) handed to the runner.
        units: usize,
    },
    /// A unit reported failure and short-circuited its run.
    UnitFailed {
        /// Name of the flow that owns the run.
        flow: String,
        /// The runner being executed.
        runner: Runner,
        /// Position of the failing unit in its input sequence.
        index: usize,
        /// Display form of the reported failure.
        message: String,
    },
    /// A unit reported after its run had already finished.
    ResultDiscarded {
        /// Name of the flow that owns the run.
        flow: String,
        /// The runner being executed.
        runner: Runner,
        /// Position of the straggling unit.
        index: usize,
    },
    /// The final callback was invoked.
    RunEnd {
        /// Name of the flow that owns the run.
        flow: String,
        /// The runner being executed.
        runner: Runner,
        /// Whether the run finished without failure.
        succeeded: bool,
        /// Wall time from invocation to final callback, in milliseconds.
        duration_ms: u128,
    },
}

/// A timestamped trace entry containing a flow event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Unix epoch timestamp in milliseconds when this event occurred.
    pub timestamp: u128,
    /// The flow event that was recorded.
    #[serde(flatten)]
    pub event: FlowEvent,
}

impl TraceEntry {
    /// Create a new trace entry with the current timestamp.
    #[must_use]
    pub fn new(event: FlowEvent) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self { timestamp, event }
    }
}
