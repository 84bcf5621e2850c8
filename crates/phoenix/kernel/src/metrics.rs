use serde::{Deserialize, Serialize};

/// Counters accumulated across kernel runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelMetrics {
    /// Iterations started.
    pub iterations: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub rollbacks: u64,
    /// Model generation failures recovered with a stub.
    pub generation_fallbacks: u64,
    pub registry_write_failures: u64,
}

impl KernelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accept(&mut self) {
        self.iterations += 1;
        self.accepted += 1;
    }

    pub fn record_reject(&mut self) {
        self.iterations += 1;
        self.rejected += 1;
    }

    pub fn record_rollback(&mut self) {
        self.rollbacks += 1;
    }

    pub fn record_fallback(&mut self) {
        self.generation_fallbacks += 1;
    }

    pub fn record_registry_failure(&mut self) {
        self.registry_write_failures += 1;
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.iterations as f64
    }
}
