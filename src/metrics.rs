//! Metrics collection for runner executions.

use serde::{Deserialize, Serialize};

/// Aggregated counters across every run recorded into a context.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Runner invocations started.
    pub runs_started: usize,
    /// Runs whose final callback reported success.
    pub runs_succeeded: usize,
    /// Runs whose final callback reported failure.
    pub runs_failed: usize,
    /// Operations invoked by runners.
    pub units_launched: usize,
    /// Operation reports accepted before their run finished.
    pub units_completed: usize,
    /// Operation reports that arrived after their run had finished.
    pub results_discarded: usize,
}

impl FlowMetrics {
    /// Count a runner invocation.
    pub fn record_run_start(&mut self) {
        self.runs_started += 1;
    }

    /// Count a finished run.
    pub fn record_run_end(&mut self, succeeded: bool) {
        if succeeded {
            self.runs_succeeded += 1;
        } else {
            self.runs_failed += 1;
        }
    }

    /// Count an invoked operation.
    pub fn record_launch(&mut self) {
        self.units_launched += 1;
    }

    /// Count an accepted operation report.
    pub fn record_completion(&mut self) {
        self.units_completed += 1;
    }

    /// Count a straggler report.
    pub fn record_discard(&mut self) {
        self.results_discarded += 1;
    }

    /// Runs started but not yet finished.
    pub fn runs_in_flight(&self) -> usize {
        self.runs_started.saturating_sub(self.runs_succeeded + self.runs_failed)
    }

    /// Check if any run failed.
    pub fn has_failures(&self) -> bool {
        self.runs_failed > 0
    }
}
