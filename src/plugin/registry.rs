//! Plugin Registry
//!
//! Three partitions (function, visualization, utility) mapping plugin ids to
//! definitions, plus a metadata side table. Ids are unique per partition;
//! lookups by id scan the partitions in a fixed order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use crate::notifications::{EventBus, PluginEvent};
use crate::plugin::definition::{
    FunctionDescriptor, PluginDefinition, PluginMetadata, PluginRef, PluginStatus, PluginType,
    RegisteredPlugin, VisualizationDescriptor,
};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::executor::ExecutorTable;
use crate::plugin::schema::{validate_definition, validate_plugin_id};

type Partition = RwLock<HashMap<String, PluginRef>>;

/// Number of registered plugins, overall and per type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginCounts {
    pub total: usize,
    pub by_type: BTreeMap<PluginType, usize>,
}

/// Registry of plugin definitions and their metadata
pub struct PluginRegistry {
    function_plugins: Partition,
    visualization_plugins: Partition,
    utility_plugins: Partition,
    metadata: RwLock<HashMap<(PluginType, String), PluginMetadata>>,
    executors: Arc<ExecutorTable>,
    events: EventBus,
}

impl PluginRegistry {
    /// Create a registry resolving named executors against `executors` and
    /// announcing registrations on `events`
    pub fn new(executors: Arc<ExecutorTable>, events: EventBus) -> Self {
        Self {
            function_plugins: RwLock::new(HashMap::new()),
            visualization_plugins: RwLock::new(HashMap::new()),
            utility_plugins: RwLock::new(HashMap::new()),
            metadata: RwLock::new(HashMap::new()),
            executors,
            events,
        }
    }

    fn partition(&self, plugin_type: PluginType) -> &Partition {
        match plugin_type {
            PluginType::Function => &self.function_plugins,
            PluginType::Visualization => &self.visualization_plugins,
            PluginType::Utility => &self.utility_plugins,
        }
    }

    /// Replace every named executor reference with the callable it names
    fn resolve_executors(&self, mut definition: PluginDefinition) -> PluginResult<PluginDefinition> {
        for (name, spec) in definition.functions.iter_mut() {
            spec.executor = self.executors.resolve(&spec.executor).map_err(|e| {
                PluginError::validation(format!("function '{}': {}", name, e))
            })?;
        }
        if let Some(executor) = definition.executor.take() {
            definition.executor = Some(self.executors.resolve(&executor)?);
        }
        Ok(definition)
    }

    /// Register a plugin under `id` in the partition named by its type.
    ///
    /// Nothing is mutated when the id is taken or the definition is invalid.
    pub async fn register(&self, id: &str, definition: PluginDefinition) -> PluginResult<()> {
        let plugin_type = definition.plugin_type;

        {
            let mut partition = self.partition(plugin_type).write();

            if partition.contains_key(id) {
                warn!("Rejected duplicate {} plugin '{}'", plugin_type, id);
                return Err(PluginError::duplicate_id(id, plugin_type.as_str()));
            }

            validate_plugin_id(id)?;
            validate_definition(&definition)?;
            let definition = self.resolve_executors(definition)?;

            // Metadata first so a dispatch that finds the plugin also finds its metadata
            self.metadata
                .write()
                .insert((plugin_type, id.to_string()), PluginMetadata::new());
            partition.insert(id.to_string(), Arc::new(RegisteredPlugin {
                id: id.to_string(),
                definition,
            }));
        }

        info!("Registered {} plugin '{}'", plugin_type, id);

        if let Err(e) = self.events.post(PluginEvent::plugin_registered(id, plugin_type)) {
            debug!("plugin-registered event for '{}' not delivered: {}", id, e);
        }

        Ok(())
    }

    /// Find a plugin by id, searching function, visualization then utility plugins
    pub fn get(&self, id: &str) -> Option<PluginRef> {
        PluginType::ALL
            .iter()
            .find_map(|plugin_type| self.get_typed(*plugin_type, id))
    }

    /// Find a plugin by id in one partition
    pub fn get_typed(&self, plugin_type: PluginType, id: &str) -> Option<PluginRef> {
        self.partition(plugin_type).read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Metadata of the plugin `get(id)` would return
    pub fn metadata(&self, id: &str) -> Option<PluginMetadata> {
        let plugin = self.get(id)?;
        self.metadata_typed(plugin.plugin_type(), id)
    }

    pub fn metadata_typed(&self, plugin_type: PluginType, id: &str) -> Option<PluginMetadata> {
        self.metadata.read().get(&(plugin_type, id.to_string())).cloned()
    }

    /// Enable or disable a plugin
    pub fn set_status(&self, plugin_type: PluginType, id: &str, status: PluginStatus) -> PluginResult<()> {
        let mut metadata = self.metadata.write();
        let entry = metadata
            .get_mut(&(plugin_type, id.to_string()))
            .ok_or_else(|| PluginError::plugin_not_found(id))?;
        info!("Plugin '{}' status {:?} -> {:?}", id, entry.status, status);
        entry.status = status;
        Ok(())
    }

    /// Record a finished execution attempt against a plugin's metadata
    pub fn record_execution(&self, plugin_type: PluginType, id: &str, success: bool) {
        let mut metadata = self.metadata.write();
        match metadata.get_mut(&(plugin_type, id.to_string())) {
            Some(entry) => entry.record_execution(success),
            None => warn!("No metadata for {} plugin '{}'", plugin_type, id),
        }
    }

    /// All plugins of one type, sorted by id
    pub fn plugins_of_type(&self, plugin_type: PluginType) -> Vec<PluginRef> {
        let mut plugins: Vec<PluginRef> = self.partition(plugin_type).read().values().cloned().collect();
        plugins.sort_by(|a, b| a.id.cmp(&b.id));
        plugins
    }

    /// All registered plugins, grouped by type in lookup order
    pub fn list_plugins(&self) -> Vec<PluginRef> {
        PluginType::ALL
            .iter()
            .flat_map(|plugin_type| self.plugins_of_type(*plugin_type))
            .collect()
    }

    /// Every function of every function and utility plugin
    pub fn list_functions(&self) -> Vec<FunctionDescriptor> {
        let mut descriptors: Vec<FunctionDescriptor> = PluginType::ALL
            .iter()
            .filter(|plugin_type| plugin_type.has_functions())
            .flat_map(|plugin_type| self.plugins_of_type(*plugin_type))
            .flat_map(|plugin| {
                let summary = plugin.summary();
                plugin
                    .definition
                    .functions
                    .iter()
                    .map(|(name, spec)| FunctionDescriptor {
                        name: format!("{}.{}", plugin.id, name),
                        description: spec.description.clone(),
                        parameters: spec.parameters.to_json_schema(),
                        plugin: summary.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Every visualization plugin
    pub fn list_visualizations(&self) -> Vec<VisualizationDescriptor> {
        self.plugins_of_type(PluginType::Visualization)
            .into_iter()
            .map(|plugin| VisualizationDescriptor {
                id: plugin.id.clone(),
                name: plugin.definition.name.clone(),
                description: plugin.definition.description.clone(),
                supported_data_types: plugin.definition.supported_data_types.clone(),
                plugin: plugin.summary(),
            })
            .collect()
    }

    pub fn counts(&self) -> PluginCounts {
        let by_type: BTreeMap<PluginType, usize> = PluginType::ALL
            .iter()
            .map(|plugin_type| (*plugin_type, self.partition(*plugin_type).read().len()))
            .collect();
        PluginCounts {
            total: by_type.values().sum(),
            by_type,
        }
    }

    pub fn plugin_count(&self) -> usize {
        self.counts().total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::tests::mock_executors::*;

    #[tokio::test]
    async fn test_registry_basic_operations() {
        let registry = PluginRegistry::new(Arc::new(ExecutorTable::new()), EventBus::new());
        assert_eq!(registry.plugin_count(), 0);

        registry.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();

        assert_eq!(registry.plugin_count(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());

        let metadata = registry.metadata("echo").unwrap();
        assert_eq!(metadata.status, PluginStatus::Registered);
        assert_eq!(metadata.execution_count, 0);
    }

    #[tokio::test]
    async fn test_same_id_in_different_partitions() {
        let registry = PluginRegistry::new(Arc::new(ExecutorTable::new()), EventBus::new());
        registry.register("shared", echo_plugin(PluginType::Utility)).await.unwrap();
        registry.register("shared", echo_plugin(PluginType::Function)).await.unwrap();

        assert_eq!(registry.plugin_count(), 2);
        // function partition is searched first
        assert_eq!(registry.get("shared").unwrap().plugin_type(), PluginType::Function);
        assert!(registry.metadata_typed(PluginType::Utility, "shared").is_some());
    }
}
