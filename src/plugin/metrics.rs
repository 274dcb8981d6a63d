//! Execution Metrics
//!
//! Aggregate and per-function counters written by the dispatcher.

use std::collections::BTreeMap;
use std::time::Duration;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Usage of one `pluginId.functionName`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub executions: u64,
    /// Cumulative execution time in milliseconds
    pub total_time: f64,
    pub errors: u64,
}

impl UsageStats {
    /// Mean execution time in milliseconds
    pub fn average_time(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.total_time / self.executions as f64
        }
    }
}

/// Process-wide execution counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Running mean execution time in milliseconds
    pub average_execution_time: f64,
    pub usage_stats: BTreeMap<String, UsageStats>,
}

impl ExecutionMetrics {
    fn record(&mut self, key: &str, elapsed: Duration, success: bool) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        self.total_executions += 1;
        if success {
            self.successful_executions += 1;
        } else {
            self.failed_executions += 1;
        }
        let n = self.total_executions as f64;
        self.average_execution_time = (self.average_execution_time * (n - 1.0) + elapsed_ms) / n;

        let usage = self.usage_stats.entry(key.to_string()).or_default();
        usage.executions += 1;
        usage.total_time += elapsed_ms;
        if !success {
            usage.errors += 1;
        }
    }

    /// Success ratio in `[0, 1]`, or `None` before the first execution
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_executions == 0 {
            None
        } else {
            Some(self.successful_executions as f64 / self.total_executions as f64)
        }
    }
}

/// Thread-safe sink for execution results
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inner: Mutex<ExecutionMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, qualified_name: &str, elapsed: Duration) {
        self.inner.lock().record(qualified_name, elapsed, true);
    }

    pub fn record_failure(&self, qualified_name: &str, elapsed: Duration) {
        self.inner.lock().record(qualified_name, elapsed, false);
    }

    /// Owned copy of the current counters
    pub fn snapshot(&self) -> ExecutionMetrics {
        self.inner.lock().clone()
    }

    pub fn usage(&self, qualified_name: &str) -> Option<UsageStats> {
        self.inner.lock().usage_stats.get(qualified_name).cloned()
    }
}
