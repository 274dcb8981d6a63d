//! Built-in Plugin Implementations
//!
//! Reference plugins built on the sequence utilities.

pub mod seq_utils;
pub mod sequence_stats;
pub mod sequence_track;

use anyhow::{anyhow, Result};
use serde_json::Value;
use crate::plugin::definition::PluginDefinition;
use crate::plugin::executor::ExecutorTable;

/// Ids of all built-in plugins, in registration order
pub fn get_builtin_plugins() -> Vec<&'static str> {
    vec![seq_utils::PLUGIN_ID, sequence_stats::PLUGIN_ID, sequence_track::PLUGIN_ID]
}

/// Create a built-in plugin definition by id
pub fn create_builtin_plugin(id: &str) -> Option<PluginDefinition> {
    match id {
        seq_utils::PLUGIN_ID => Some(seq_utils::definition()),
        sequence_stats::PLUGIN_ID => Some(sequence_stats::definition()),
        sequence_track::PLUGIN_ID => Some(sequence_track::definition()),
        _ => None,
    }
}

/// Register the named executors the built-in definitions refer to
pub fn register_builtin_executors(table: &ExecutorTable) {
    seq_utils::register_executors(table);
    sequence_track::register_executors(table);
}

/// Required string parameter
pub(crate) fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("parameter '{}' must be a string", name))
}

/// Optional boolean parameter
pub(crate) fn bool_param(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}
