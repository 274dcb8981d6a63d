//! Function Dispatcher
//!
//! The single entry point for `pluginId.functionName(params)` calls. A call is
//! validated against the registry before any shared counters are touched,
//! then admitted, executed, measured and announced. Events are posted to the
//! bus after the metrics are recorded; subscriber delivery never holds up the
//! caller.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures::FutureExt;
use log::{debug, error, warn};
use serde_json::{Map, Value};
use crate::notifications::{EventBus, PluginEvent};
use crate::plugin::admission::{AdmissionController, ExecutionOutcome};
use crate::plugin::context::ExecutionContext;
use crate::plugin::executor::FunctionExecutor;
use crate::plugin::definition::{PluginRef, PluginStatus};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::metrics::MetricsCollector;
use crate::plugin::registry::PluginRegistry;
use crate::plugin::schema::validate_parameters;

/// Split `pluginId.functionName` on the first '.'
pub fn parse_qualified_name(qualified_name: &str) -> PluginResult<(&str, &str)> {
    match qualified_name.split_once('.') {
        Some((plugin_id, function_name)) if !plugin_id.is_empty() && !function_name.is_empty() => {
            Ok((plugin_id, function_name))
        }
        _ => Err(PluginError::invalid_call_format(qualified_name)),
    }
}

fn elapsed_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// Routes calls into plugin executors
pub struct FunctionDispatcher {
    registry: Arc<PluginRegistry>,
    admission: Arc<AdmissionController>,
    metrics: Arc<MetricsCollector>,
    events: EventBus,
}

impl FunctionDispatcher {
    pub fn new(
        registry: Arc<PluginRegistry>,
        admission: Arc<AdmissionController>,
        metrics: Arc<MetricsCollector>,
        events: EventBus,
    ) -> Self {
        Self { registry, admission, metrics, events }
    }

    /// Resolve and check a call without touching admission or metrics
    fn validate_call(
        &self,
        plugin_id: &str,
        function_name: &str,
        parameters: &Value,
    ) -> PluginResult<(PluginRef, Arc<dyn FunctionExecutor>)> {
        let plugin = self
            .registry
            .get(plugin_id)
            .ok_or_else(|| PluginError::plugin_not_found(plugin_id))?;

        let spec = plugin
            .function(function_name)
            .ok_or_else(|| PluginError::function_not_found(plugin_id, function_name))?;

        let disabled = self
            .registry
            .metadata_typed(plugin.plugin_type(), plugin_id)
            .map(|metadata| metadata.status == PluginStatus::Disabled)
            .unwrap_or(false);
        if disabled {
            return Err(PluginError::plugin_disabled(plugin_id));
        }

        validate_parameters(parameters, &spec.parameters)?;

        let executor = spec
            .executor
            .callable()
            .map(Arc::clone)
            .ok_or_else(|| PluginError::executor_error(plugin_id, function_name, "executor not resolved"))?;
        Ok((plugin, executor))
    }

    /// Execute a plugin function by its qualified name
    pub async fn execute_function_by_name(&self, qualified_name: &str, parameters: Value) -> PluginResult<Value> {
        let start = Instant::now();
        let (plugin_id, function_name) = parse_qualified_name(qualified_name)?;
        let parameters = if parameters.is_null() { Value::Object(Map::new()) } else { parameters };

        let (plugin, executor) = self.validate_call(plugin_id, function_name, &parameters)?;
        let plugin_type = plugin.plugin_type();
        let priority = plugin.definition.priority;

        let permit = match self.admission.admit(plugin_id, function_name, priority) {
            Ok(permit) => permit,
            Err(reason) => {
                let elapsed = start.elapsed();
                warn!("Execution of {} denied: {}", qualified_name, reason);
                self.metrics.record_failure(qualified_name, elapsed);
                self.registry.record_execution(plugin_type, plugin_id, false);
                let err = PluginError::execution_denied(reason);
                self.emit(PluginEvent::FunctionError {
                    plugin_id: plugin_id.to_string(),
                    function_name: function_name.to_string(),
                    parameters,
                    error: err.to_string(),
                    execution_time: elapsed_ms(elapsed),
                });
                return Err(err);
            }
        };

        // If this future is dropped from here on, the permit frees the slot
        debug!("Executing {} as {}", qualified_name, permit.execution_id());
        let context = ExecutionContext::new(plugin_id, function_name, permit.execution_id().clone(), priority);
        let outcome = AssertUnwindSafe(executor.execute(&context, &parameters))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(_panic) => {
                error!("Executor for {} panicked", qualified_name);
                Err("executor panicked".to_string())
            }
        };

        let release_outcome = if result.is_ok() { ExecutionOutcome::Success } else { ExecutionOutcome::Error };
        if let Err(e) = permit.release(release_outcome) {
            error!("Failed to release slot for {}: {}", qualified_name, e);
        }

        let elapsed = start.elapsed();
        match result {
            Ok(value) => {
                self.metrics.record_success(qualified_name, elapsed);
                self.registry.record_execution(plugin_type, plugin_id, true);
                debug!("{} completed in {:?}", qualified_name, elapsed);
                self.emit(PluginEvent::FunctionExecuted {
                    plugin_id: plugin_id.to_string(),
                    function_name: function_name.to_string(),
                    parameters,
                    result: value.clone(),
                    execution_time: elapsed_ms(elapsed),
                });
                Ok(value)
            }
            Err(message) => {
                self.metrics.record_failure(qualified_name, elapsed);
                self.registry.record_execution(plugin_type, plugin_id, false);
                warn!("{} failed after {:?}: {}", qualified_name, elapsed, message);
                let err = PluginError::executor_error(plugin_id, function_name, message);
                self.emit(PluginEvent::FunctionError {
                    plugin_id: plugin_id.to_string(),
                    function_name: function_name.to_string(),
                    parameters,
                    error: err.to_string(),
                    execution_time: elapsed_ms(elapsed),
                });
                Err(err)
            }
        }
    }

    fn emit(&self, event: PluginEvent) {
        if let Err(e) = self.events.post(event) {
            debug!("Event not published: {}", e);
        }
    }
}
