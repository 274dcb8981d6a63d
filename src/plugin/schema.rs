//! Parameter Schemas and Validation
//!
//! A small closed schema language shared by inbound parameter validation and
//! outbound tool-manifest generation, plus structural checks for plugin
//! definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use crate::plugin::definition::{PluginDefinition, PluginType};
use crate::plugin::error::{PluginError, PluginResult};

/// Kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Name used in JSON Schema documents
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// Check whether a JSON value has this kind. NaN never matches `number`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.as_f64().map_or(false, |n| !n.is_nan()),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human readable kind of a runtime value, for error messages
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared type of a single parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn new(kind: SchemaType) -> Self {
        Self { kind, description: None }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Schema of the parameter object accepted by a plugin function.
///
/// The schema is open: parameters not named in `properties` are accepted
/// without checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional property
    pub fn property<N, D>(mut self, name: N, kind: SchemaType, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.properties.insert(name.into(), PropertySchema::new(kind).with_description(description));
        self
    }

    /// Add a required property
    pub fn required_property<N, D>(mut self, name: N, kind: SchemaType, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.property(name, kind, description)
    }

    /// Render as a JSON Schema object for tool-calling manifests
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, prop)| {
                let mut node = json!({ "type": prop.kind.as_str() });
                if let Some(description) = &prop.description {
                    node["description"] = Value::String(description.clone());
                }
                (name.clone(), node)
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Validate a parameter object against a schema.
///
/// `null` is treated as an empty object. Every problem found is reported in a
/// single `InvalidParameters` error.
pub fn validate_parameters(params: &Value, schema: &ParameterSchema) -> PluginResult<()> {
    let empty = Map::new();
    let object = match params {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(PluginError::invalid_parameters(format!(
                "parameters must be an object, got {}",
                value_kind(other)
            )));
        }
    };

    let mut problems = Vec::new();

    for name in &schema.required {
        if !object.contains_key(name) {
            problems.push(format!("missing required parameter '{}'", name));
        }
    }

    for (name, prop) in &schema.properties {
        if let Some(value) = object.get(name) {
            if !prop.kind.matches(value) {
                problems.push(format!(
                    "parameter '{}' must be {}, got {}",
                    name,
                    prop.kind,
                    value_kind(value)
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PluginError::invalid_parameters(problems.join("; ")))
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("identifier pattern is valid")
    })
}

/// Check that a plugin id can be addressed by a qualified name
pub fn validate_plugin_id(plugin_id: &str) -> PluginResult<()> {
    if identifier_pattern().is_match(plugin_id) {
        Ok(())
    } else {
        Err(PluginError::validation(format!(
            "plugin id '{}' must start with a letter or digit and contain only letters, digits, '-' or '_'",
            plugin_id
        )))
    }
}

/// Structural validation of a plugin definition
pub fn validate_definition(definition: &PluginDefinition) -> PluginResult<()> {
    let mut missing = Vec::new();
    if definition.name.trim().is_empty() {
        missing.push("name");
    }
    if definition.description.trim().is_empty() {
        missing.push("description");
    }
    if definition.version.trim().is_empty() {
        missing.push("version");
    }
    if !missing.is_empty() {
        return Err(PluginError::validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }

    match definition.plugin_type {
        PluginType::Function | PluginType::Utility => {
            if definition.functions.is_empty() {
                return Err(PluginError::validation(format!(
                    "{} plugin '{}' must declare at least one function",
                    definition.plugin_type, definition.name
                )));
            }
            for name in definition.functions.keys() {
                if name.is_empty() || name.contains('.') {
                    return Err(PluginError::validation(format!(
                        "invalid function name '{}' in plugin '{}'",
                        name, definition.name
                    )));
                }
            }
        }
        PluginType::Visualization => {
            if definition.supported_data_types.is_empty() {
                return Err(PluginError::validation(format!(
                    "visualization plugin '{}' must declare supported data types",
                    definition.name
                )));
            }
            if definition.executor.is_none() {
                return Err(PluginError::validation(format!(
                    "visualization plugin '{}' must declare an executor",
                    definition.name
                )));
            }
        }
    }

    Ok(())
}
