//! Notification Event Types
//!
//! Events published by the plugin runtime. Every event has a stable
//! kebab-case type name and a JSON-serializable payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::plugin::definition::PluginType;

/// Base trait for all notification events
pub trait NotificationEvent: Send + Sync + Clone + std::fmt::Debug + 'static {
    /// Type name subscribers filter on
    fn event_type(&self) -> &'static str;
}

pub const PLUGIN_REGISTERED: &str = "plugin-registered";
pub const FUNCTION_EXECUTED: &str = "function-executed";
pub const FUNCTION_ERROR: &str = "function-error";
pub const SYSTEM_INITIALIZED: &str = "system-initialized";
pub const SYSTEM_DESTROYED: &str = "system-destroyed";

/// Runtime lifecycle and execution events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PluginEvent {
    /// A plugin was added to the registry
    #[serde(rename_all = "camelCase")]
    PluginRegistered {
        plugin_id: String,
        #[serde(rename = "type")]
        plugin_type: PluginType,
    },

    /// A function call completed
    #[serde(rename_all = "camelCase")]
    FunctionExecuted {
        plugin_id: String,
        function_name: String,
        parameters: Value,
        result: Value,
        /// Milliseconds from dispatch to completion
        execution_time: f64,
    },

    /// A function call was denied or its executor failed
    #[serde(rename_all = "camelCase")]
    FunctionError {
        plugin_id: String,
        function_name: String,
        parameters: Value,
        error: String,
        execution_time: f64,
    },

    SystemInitialized { timestamp: DateTime<Utc> },

    SystemDestroyed { timestamp: DateTime<Utc> },
}

impl PluginEvent {
    pub fn plugin_registered<S: Into<String>>(plugin_id: S, plugin_type: PluginType) -> Self {
        PluginEvent::PluginRegistered { plugin_id: plugin_id.into(), plugin_type }
    }

    pub fn system_initialized() -> Self {
        PluginEvent::SystemInitialized { timestamp: Utc::now() }
    }

    pub fn system_destroyed() -> Self {
        PluginEvent::SystemDestroyed { timestamp: Utc::now() }
    }

    /// Plugin the event concerns, if any
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            PluginEvent::PluginRegistered { plugin_id, .. }
            | PluginEvent::FunctionExecuted { plugin_id, .. }
            | PluginEvent::FunctionError { plugin_id, .. } => Some(plugin_id),
            PluginEvent::SystemInitialized { .. } | PluginEvent::SystemDestroyed { .. } => None,
        }
    }

    /// Payload without the event envelope
    pub fn payload(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null)
    }
}

impl NotificationEvent for PluginEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PluginEvent::PluginRegistered { .. } => PLUGIN_REGISTERED,
            PluginEvent::FunctionExecuted { .. } => FUNCTION_EXECUTED,
            PluginEvent::FunctionError { .. } => FUNCTION_ERROR,
            PluginEvent::SystemInitialized { .. } => SYSTEM_INITIALIZED,
            PluginEvent::SystemDestroyed { .. } => SYSTEM_DESTROYED,
        }
    }
}
