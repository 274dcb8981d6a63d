//! Plugin Manifests
//!
//! Serialized plugin descriptions (YAML or JSON). Executors are referenced by
//! name and resolved against the executor table when the plugin is registered.
//!
//! ```yaml
//! id: motif-tools
//! type: utility
//! name: Motif Tools
//! description: Motif search helpers
//! version: 1.0.0
//! functions:
//!   findMotif:
//!     description: Locate a motif in a sequence
//!     executor: motif.find
//!     parameters:
//!       required: [sequence, motif]
//!       properties:
//!         sequence: { type: string }
//!         motif: { type: string }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::plugin::definition::{FunctionSpec, PluginDefinition, PluginType, Priority};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::executor::ExecutorRef;
use crate::plugin::schema::ParameterSchema;

/// Function entry of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionManifest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: ParameterSchema,
    /// Name of a registered executor
    pub executor: String,
}

/// On-disk plugin description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub id: String,
    /// Kept as text so an unknown kind is reported as a validation error
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, FunctionManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_data_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
}

impl PluginManifest {
    pub fn from_yaml(content: &str) -> PluginResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> PluginResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a manifest, choosing the format from the file extension
    pub fn parse_for_path(path: &Path, content: &str) -> PluginResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(content),
            Some("yaml") | Some("yml") => Self::from_yaml(content),
            _ => Err(PluginError::manifest_error(format!(
                "unsupported manifest extension: {}",
                path.display()
            ))),
        }
    }

    /// Convert to the id and definition to register
    pub fn into_definition(self) -> PluginResult<(String, PluginDefinition)> {
        let plugin_type: PluginType = self.plugin_type.parse()?;

        let mut definition = PluginDefinition::new(plugin_type, self.name, self.description, self.version)
            .with_priority(self.priority)
            .with_supported_data_types(self.supported_data_types);
        definition.category = self.category;
        definition.executor = self.executor.map(ExecutorRef::Named);

        for (name, function) in self.functions {
            definition = definition.with_function(
                name,
                FunctionSpec::new(function.description, function.parameters, ExecutorRef::Named(function.executor)),
            );
        }

        Ok((self.id, definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::schema::SchemaType;

    const UTILITY_YAML: &str = r#"
id: motif-tools
type: utility
name: Motif Tools
description: Motif search helpers
version: 1.0.0
priority: high
functions:
  findMotif:
    description: Locate a motif in a sequence
    executor: motif.find
    parameters:
      required: [sequence, motif]
      properties:
        sequence: { type: string, description: DNA sequence }
        motif: { type: string }
"#;

    #[test]
    fn test_yaml_manifest_to_definition() {
        let manifest = PluginManifest::from_yaml(UTILITY_YAML).unwrap();
        let (id, definition) = manifest.into_definition().unwrap();

        assert_eq!(id, "motif-tools");
        assert_eq!(definition.plugin_type, PluginType::Utility);
        assert_eq!(definition.priority, Priority::High);

        let function = &definition.functions["findMotif"];
        assert_eq!(function.parameters.required, vec!["sequence", "motif"]);
        assert_eq!(function.parameters.properties["sequence"].kind, SchemaType::String);
        assert!(matches!(&function.executor, ExecutorRef::Named(name) if name == "motif.find"));
    }

    #[test]
    fn test_json_visualization_manifest() {
        let manifest = PluginManifest::from_json(r#"{
            "id": "gc-plot",
            "type": "visualization",
            "name": "GC Plot",
            "description": "GC content along a sequence",
            "version": "0.2.0",
            "supportedDataTypes": ["dna"],
            "executor": "gc.plot"
        }"#).unwrap();

        let (_, definition) = manifest.into_definition().unwrap();
        assert_eq!(definition.plugin_type, PluginType::Visualization);
        assert_eq!(definition.supported_data_types, vec!["dna"]);
        assert!(definition.executor.is_some());
    }

    #[test]
    fn test_unknown_type_is_a_validation_error() {
        let manifest = PluginManifest::from_yaml("id: x\ntype: widget\nname: n\n").unwrap();
        assert!(matches!(manifest.into_definition(), Err(PluginError::ValidationError { .. })));
    }

    #[test]
    fn test_malformed_manifest_is_a_manifest_error() {
        assert!(matches!(PluginManifest::from_yaml("id: [unclosed"), Err(PluginError::ManifestError { .. })));
        assert!(matches!(PluginManifest::from_json("{"), Err(PluginError::ManifestError { .. })));
        assert!(PluginManifest::parse_for_path(Path::new("plugin.toml"), "").is_err());
    }
}
