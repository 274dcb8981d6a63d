//! Plugin Definitions
//!
//! Declarative description of a plugin: its kind, identity, and the functions
//! or render contract it exposes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::plugin::error::PluginError;
use crate::plugin::executor::ExecutorRef;
use crate::plugin::schema::ParameterSchema;

/// Partition a plugin is registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Function,
    Visualization,
    Utility,
}

impl PluginType {
    /// Lookup order used when resolving an id across partitions
    pub const ALL: [PluginType; 3] = [PluginType::Function, PluginType::Visualization, PluginType::Utility];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Function => "function",
            PluginType::Visualization => "visualization",
            PluginType::Utility => "utility",
        }
    }

    /// Whether plugins of this type expose callable functions
    pub fn has_functions(&self) -> bool {
        matches!(self, PluginType::Function | PluginType::Utility)
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginType {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "function" => Ok(PluginType::Function),
            "visualization" => Ok(PluginType::Visualization),
            "utility" => Ok(PluginType::Utility),
            "" => Err(PluginError::validation("missing required field(s): type")),
            other => Err(PluginError::validation(format!(
                "unknown plugin type '{}'. Valid types: function, visualization, utility",
                other
            ))),
        }
    }
}

/// Scheduling hint carried with every execution request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        };
        f.write_str(name)
    }
}

/// A callable function exposed by a function or utility plugin
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub description: String,
    pub parameters: ParameterSchema,
    pub executor: ExecutorRef,
}

impl FunctionSpec {
    pub fn new<S: Into<String>>(description: S, parameters: ParameterSchema, executor: ExecutorRef) -> Self {
        Self {
            description: description.into(),
            parameters,
            executor,
        }
    }
}

/// Declarative plugin definition, immutable once registered
#[derive(Debug, Clone)]
pub struct PluginDefinition {
    pub plugin_type: PluginType,
    pub name: String,
    pub description: String,
    pub version: String,
    pub category: Option<String>,
    pub priority: Priority,
    /// Functions of function and utility plugins
    pub functions: BTreeMap<String, FunctionSpec>,
    /// Data types a visualization plugin can render
    pub supported_data_types: Vec<String>,
    /// Render executor of a visualization plugin
    pub executor: Option<ExecutorRef>,
}

impl PluginDefinition {
    /// Start a definition of the given type
    pub fn new<N, D, V>(plugin_type: PluginType, name: N, description: D, version: V) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        V: Into<String>,
    {
        Self {
            plugin_type,
            name: name.into(),
            description: description.into(),
            version: version.into(),
            category: None,
            priority: Priority::Normal,
            functions: BTreeMap::new(),
            supported_data_types: Vec::new(),
            executor: None,
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_function<S: Into<String>>(mut self, name: S, spec: FunctionSpec) -> Self {
        self.functions.insert(name.into(), spec);
        self
    }

    pub fn with_supported_data_types<I, S>(mut self, data_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_data_types = data_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_executor(mut self, executor: ExecutorRef) -> Self {
        self.executor = Some(executor);
        self
    }
}

/// A definition together with the id it was registered under
#[derive(Debug, Clone)]
pub struct RegisteredPlugin {
    pub id: String,
    pub definition: PluginDefinition,
}

impl RegisteredPlugin {
    pub fn plugin_type(&self) -> PluginType {
        self.definition.plugin_type
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.definition.functions.get(name)
    }

    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            id: self.id.clone(),
            name: self.definition.name.clone(),
            version: self.definition.version.clone(),
            plugin_type: self.definition.plugin_type,
            category: self.definition.category.clone(),
            priority: self.definition.priority,
        }
    }
}

/// Lifecycle status of a registered plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Registered,
    Active,
    Disabled,
}

/// Bookkeeping kept for every registered plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    pub registered_at: DateTime<Utc>,
    pub last_executed: Option<DateTime<Utc>>,
    pub execution_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub status: PluginStatus,
}

impl PluginMetadata {
    pub fn new() -> Self {
        Self {
            registered_at: Utc::now(),
            last_executed: None,
            execution_count: 0,
            success_count: 0,
            error_count: 0,
            status: PluginStatus::Registered,
        }
    }

    /// Record one finished execution attempt
    pub fn record_execution(&mut self, success: bool) {
        self.last_executed = Some(Utc::now());
        self.execution_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        if success && self.status == PluginStatus::Registered {
            self.status = PluginStatus::Active;
        }
    }
}

impl Default for PluginMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a plugin as seen by tool-calling consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub priority: Priority,
}

/// Flattened function entry, suitable as a tool-calling manifest item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    /// Qualified name `pluginId.functionName`
    pub name: String,
    pub description: String,
    /// JSON Schema of the parameter object
    pub parameters: serde_json::Value,
    pub plugin: PluginSummary,
}

/// Flattened visualization entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub supported_data_types: Vec<String>,
    pub plugin: PluginSummary,
}

/// Shared handle to a registered plugin
pub type PluginRef = Arc<RegisteredPlugin>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_type_parsing() {
        assert_eq!("function".parse::<PluginType>().unwrap(), PluginType::Function);
        assert_eq!("Visualization".parse::<PluginType>().unwrap(), PluginType::Visualization);
        assert_eq!(" utility ".parse::<PluginType>().unwrap(), PluginType::Utility);
        assert!(matches!("widget".parse::<PluginType>(), Err(PluginError::ValidationError { .. })));
        assert!("".parse::<PluginType>().is_err());
    }

    #[test]
    fn test_metadata_counters_stay_consistent() {
        let mut metadata = PluginMetadata::new();
        assert_eq!(metadata.status, PluginStatus::Registered);

        metadata.record_execution(true);
        metadata.record_execution(false);
        metadata.record_execution(true);

        assert_eq!(metadata.execution_count, 3);
        assert_eq!(metadata.execution_count, metadata.success_count + metadata.error_count);
        assert_eq!(metadata.status, PluginStatus::Active);
        assert!(metadata.last_executed.is_some());
    }

    #[test]
    fn test_disabled_status_is_sticky() {
        let mut metadata = PluginMetadata::new();
        metadata.status = PluginStatus::Disabled;
        metadata.record_execution(true);
        assert_eq!(metadata.status, PluginStatus::Disabled);
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default(), Priority::Normal);
        let definition = PluginDefinition::new(PluginType::Utility, "n", "d", "1.0.0");
        assert_eq!(definition.priority, Priority::Normal);
    }
}
