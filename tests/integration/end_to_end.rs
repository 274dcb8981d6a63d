//! End-to-End Integration Tests
//!
//! Drives the runtime through its public API: built-ins, manifests,
//! dispatch, statistics and the tool manifest.

use std::sync::Arc;
use serde_json::json;
use tempfile::TempDir;

use genome_plugins::config::ConfigManager;
use genome_plugins::plugin::executor::sync_executor;
use genome_plugins::plugin::{PluginError, PluginStatus, PluginType};
use genome_plugins::runtime::{PluginRuntime, RuntimeConfig};

async fn runtime_with_builtins() -> PluginRuntime {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    runtime.initialize().await.expect("initialize");
    runtime.register_builtin_plugins().await.expect("builtins");
    runtime
}

#[tokio::test]
async fn builtin_plugins_are_callable() {
    let runtime = runtime_with_builtins().await;

    let rc = runtime
        .execute_function_by_name("seq-utils.reverseComplement", json!({"sequence": "ATCG"}))
        .await
        .unwrap();
    assert_eq!(rc, json!("CGAT"));

    let gc = runtime
        .execute_function_by_name("seq-utils.gcContent", json!({"sequence": "GGCCAATT"}))
        .await
        .unwrap();
    assert_eq!(gc["gcContent"], json!(50.0));

    let protein = runtime
        .execute_function_by_name("seq-utils.translate", json!({"sequence": "ATGGCCTAA", "toStop": true}))
        .await
        .unwrap();
    assert_eq!(protein["protein"], json!("MA"));

    let track = runtime
        .execute_function_by_name("sequence-track.render", json!({"sequence": "GGGGAAAA", "windowSize": 4}))
        .await;
    assert!(matches!(track, Err(PluginError::FunctionNotFound { .. })), "visualizations expose no functions");

    runtime.destroy().await;
}

#[tokio::test]
async fn tool_manifest_lists_every_callable_function() {
    let runtime = runtime_with_builtins().await;

    let tools = runtime.tool_manifest();
    let functions = runtime.list_functions();
    assert_eq!(tools.len(), functions.len());
    assert!(!tools.is_empty());

    for tool in &tools {
        let name = tool["name"].as_str().unwrap();
        assert_eq!(name.split('.').count(), 2, "{} is not qualified", name);
        assert!(!tool["description"].as_str().unwrap().is_empty());
        assert_eq!(tool["parameters"]["type"], json!("object"));
    }

    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"seq-utils.reverseComplement"));
    assert!(names.contains(&"sequence-stats.aminoAcidComposition"));
}

#[tokio::test]
async fn system_stats_reflect_activity() {
    let runtime = runtime_with_builtins().await;

    runtime
        .execute_function_by_name("seq-utils.gcContent", json!({"sequence": "ATGC"}))
        .await
        .unwrap();
    let _ = runtime.execute_function_by_name("seq-utils.translate", json!({"sequence": "AT"})).await;
    let _ = runtime.execute_function_by_name("seq-utils.gcContent", json!({})).await;

    let stats = runtime.get_system_stats().await;
    assert_eq!(stats.plugins.total, 3);
    assert_eq!(stats.plugins.by_type[&PluginType::Visualization], 1);
    assert_eq!(stats.execution.total_executions, 2);
    assert_eq!(stats.execution.successful_executions, 1);
    assert_eq!(stats.execution.failed_executions, 1);
    assert_eq!(stats.resources.admission.active_executions, 0);
    assert!(stats.resources.events_published >= 4);

    let value = serde_json::to_value(&stats).unwrap();
    assert!(value["execution"]["usageStats"]["seq-utils.gcContent"].is_object());
    assert!(value["resources"]["uptimeMs"].is_u64());
}

#[tokio::test]
async fn disabled_plugin_is_reported_and_can_be_reenabled() {
    let runtime = runtime_with_builtins().await;

    runtime.set_plugin_status("sequence-stats", PluginStatus::Disabled).unwrap();
    let result = runtime
        .execute_function_by_name("sequence-stats.residueClasses", json!({"protein": "MKV"}))
        .await;
    assert_eq!(result, Err(PluginError::plugin_disabled("sequence-stats")));

    runtime.set_plugin_status("sequence-stats", PluginStatus::Active).unwrap();
    assert!(runtime
        .execute_function_by_name("sequence-stats.residueClasses", json!({"protein": "MKV"}))
        .await
        .is_ok());

    assert!(runtime.set_plugin_status("nope", PluginStatus::Active).is_err());
}

#[tokio::test]
async fn config_file_drives_manifest_loading() {
    let temp = TempDir::new().unwrap();
    let plugin_dir = temp.path().join("plugins");
    std::fs::create_dir_all(&plugin_dir).unwrap();
    std::fs::write(
        plugin_dir.join("kmer.yaml"),
        r#"
id: kmer
type: function
name: K-mer Tools
description: K-mer counting
version: 0.1.0
functions:
  distinct:
    description: Number of distinct k-mers
    executor: kmer.distinct
    parameters:
      required: [sequence, k]
      properties:
        sequence: { type: string }
        k: { type: number }
"#,
    )
    .unwrap();

    let config_path = temp.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[runtime]\nmax-concurrent-executions = 2\nplugin-dir = \"{}\"\n",
            plugin_dir.display()
        ),
    )
    .unwrap();

    let manager = ConfigManager::load_from_file(config_path).unwrap();
    let config = manager.get_runtime_config().unwrap();
    assert_eq!(config.max_concurrent_executions, 2);

    let runtime = Arc::new(PluginRuntime::new(config));
    runtime.register_executor("kmer.distinct", sync_executor(|_, params| {
        let sequence = params["sequence"].as_str().unwrap_or_default();
        let k = params["k"].as_u64().unwrap_or(1) as usize;
        let distinct: std::collections::HashSet<&str> = (0..=sequence.len().saturating_sub(k))
            .filter_map(|i| sequence.get(i..i + k))
            .collect();
        Ok(json!(distinct.len()))
    }));

    assert_eq!(runtime.load_configured_manifests().await.unwrap(), 1);
    let distinct = runtime
        .execute_function_by_name("kmer.distinct", json!({"sequence": "AAAA", "k": 2}))
        .await
        .unwrap();
    assert_eq!(distinct, json!(1));

    let textual = runtime
        .execute_function_by_name("kmer.distinct", json!({"sequence": "AAAA", "k": "2"}))
        .await;
    assert!(matches!(textual, Err(PluginError::InvalidParameters { .. })));
}
