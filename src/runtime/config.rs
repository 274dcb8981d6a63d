//! Runtime Configuration

use std::path::PathBuf;
use std::time::Duration;
use crate::plugin::error::{PluginError, PluginResult};

/// Tuning for a [`PluginRuntime`](super::PluginRuntime)
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Executions allowed in flight at once
    pub max_concurrent_executions: usize,
    /// Per-subscriber event delivery timeout
    pub event_timeout: Duration,
    /// Buffer of the broadcast event stream
    pub event_stream_capacity: usize,
    /// Directory of plugin manifests loaded at startup
    pub plugin_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_executions: num_cpus::get().max(1),
            event_timeout: Duration::from_millis(5000),
            event_stream_capacity: 256,
            plugin_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_max_concurrent_executions(mut self, max: usize) -> Self {
        self.max_concurrent_executions = max;
        self
    }

    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn with_plugin_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.plugin_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> PluginResult<()> {
        if self.max_concurrent_executions == 0 {
            return Err(PluginError::configuration_error(
                "max-concurrent-executions must be at least 1",
            ));
        }
        if self.event_timeout.is_zero() {
            return Err(PluginError::configuration_error("event-timeout-ms must be greater than 0"));
        }
        if self.event_stream_capacity == 0 {
            return Err(PluginError::configuration_error("event-stream-capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_executions, num_cpus::get().max(1));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = RuntimeConfig::default().with_max_concurrent_executions(0);
        assert!(matches!(config.validate(), Err(PluginError::ConfigurationError { .. })));

        let config = RuntimeConfig::default().with_event_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
