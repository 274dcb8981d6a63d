//! Execution Admission Control
//!
//! Bounds the number of plugin calls executing at once. Requests are granted
//! immediately while capacity remains and denied otherwise; nothing is queued.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::plugin::definition::Priority;
use crate::plugin::error::{PluginError, PluginResult};

/// Reason reported when every slot is taken
pub const CONCURRENCY_LIMIT_REACHED: &str = "concurrency limit reached";

/// Opaque token identifying one admitted execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of an admission request
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Granted { execution_id: ExecutionId },
    Denied { reason: String },
}

impl AdmissionDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AdmissionDecision::Granted { .. })
    }
}

/// Slot held by one admitted execution. Dropping the permit without calling
/// [`ExecutionPermit::release`] frees the slot with an error outcome.
#[derive(Debug)]
pub struct ExecutionPermit {
    controller: Arc<AdmissionController>,
    execution_id: ExecutionId,
    released: bool,
}

impl ExecutionPermit {
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Free the slot with the given outcome
    pub fn release(mut self, outcome: ExecutionOutcome) -> PluginResult<()> {
        self.released = true;
        self.controller.release_execution(&self.execution_id, outcome)
    }
}

impl Drop for ExecutionPermit {
    fn drop(&mut self) {
        if !self.released {
            warn!("Execution {} abandoned before release", self.execution_id);
            let _ = self.controller.release_execution(&self.execution_id, ExecutionOutcome::Error);
        }
    }
}

/// How an admitted execution finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success,
    Error,
}

/// An execution currently holding a slot
#[derive(Debug, Clone)]
struct InFlight {
    plugin_id: String,
    function_name: String,
    priority: Priority,
    granted_at: Instant,
}

#[derive(Debug, Default)]
struct AdmissionState {
    in_flight: HashMap<ExecutionId, InFlight>,
    total_granted: u64,
    total_denied: u64,
    total_released: u64,
    released_with_error: u64,
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionSnapshot {
    pub max_concurrent_executions: usize,
    pub active_executions: usize,
    pub total_granted: u64,
    pub total_denied: u64,
    pub total_released: u64,
    pub released_with_error: u64,
    /// Active executions per priority hint
    pub active_by_priority: HashMap<Priority, usize>,
}

/// Grants or denies execution slots against a fixed maximum
#[derive(Debug)]
pub struct AdmissionController {
    max_concurrent: usize,
    state: Mutex<AdmissionState>,
}

impl AdmissionController {
    /// Create a controller; a limit of zero is raised to one
    pub fn new(max_concurrent_executions: usize) -> Self {
        if max_concurrent_executions == 0 {
            warn!("max concurrent executions of 0 would deny every call, using 1");
        }
        Self {
            max_concurrent: max_concurrent_executions.max(1),
            state: Mutex::new(AdmissionState::default()),
        }
    }

    pub fn max_concurrent_executions(&self) -> usize {
        self.max_concurrent
    }

    /// Request a slot. The priority is recorded but does not reorder admission.
    pub fn request_execution(&self, plugin_id: &str, function_name: &str, priority: Priority) -> AdmissionDecision {
        let mut state = self.state.lock();

        if state.in_flight.len() >= self.max_concurrent {
            state.total_denied += 1;
            debug!(
                "Denied {}.{} ({} of {} slots in use)",
                plugin_id, function_name, state.in_flight.len(), self.max_concurrent
            );
            return AdmissionDecision::Denied { reason: CONCURRENCY_LIMIT_REACHED.to_string() };
        }

        let execution_id = ExecutionId::new();
        state.in_flight.insert(execution_id.clone(), InFlight {
            plugin_id: plugin_id.to_string(),
            function_name: function_name.to_string(),
            priority,
            granted_at: Instant::now(),
        });
        state.total_granted += 1;
        debug!("Granted {}.{} as {} ({} priority)", plugin_id, function_name, execution_id, priority);

        AdmissionDecision::Granted { execution_id }
    }

    /// Request a slot held by a permit. Denials carry the reason.
    pub fn admit(
        self: &Arc<Self>,
        plugin_id: &str,
        function_name: &str,
        priority: Priority,
    ) -> Result<ExecutionPermit, String> {
        match self.request_execution(plugin_id, function_name, priority) {
            AdmissionDecision::Granted { execution_id } => Ok(ExecutionPermit {
                controller: Arc::clone(self),
                execution_id,
                released: false,
            }),
            AdmissionDecision::Denied { reason } => Err(reason),
        }
    }

    /// Release a slot. Unknown or already released tokens are rejected
    /// without changing any counter.
    pub fn release_execution(&self, execution_id: &ExecutionId, outcome: ExecutionOutcome) -> PluginResult<()> {
        let mut state = self.state.lock();

        let entry = state
            .in_flight
            .remove(execution_id)
            .ok_or_else(|| PluginError::unknown_execution(execution_id.to_string()))?;

        state.total_released += 1;
        if outcome == ExecutionOutcome::Error {
            state.released_with_error += 1;
        }
        debug!(
            "Released {}.{} ({}) after {:?} with {:?}",
            entry.plugin_id, entry.function_name, execution_id, entry.granted_at.elapsed(), outcome
        );
        Ok(())
    }

    pub fn active_executions(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn snapshot(&self) -> AdmissionSnapshot {
        let state = self.state.lock();
        let mut active_by_priority = HashMap::new();
        for entry in state.in_flight.values() {
            *active_by_priority.entry(entry.priority).or_insert(0) += 1;
        }
        AdmissionSnapshot {
            max_concurrent_executions: self.max_concurrent,
            active_executions: state.in_flight.len(),
            total_granted: state.total_granted,
            total_denied: state.total_denied,
            total_released: state.total_released,
            released_with_error: state.released_with_error,
            active_by_priority,
        }
    }
}
