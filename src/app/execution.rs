//! Command execution

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;
use genome_plugins::cli::Command;
use genome_plugins::display::{self, ColourManager};
use genome_plugins::runtime::PluginRuntime;

/// Create a runtime with built-in plugins and any configured manifests
pub async fn prepare_runtime(runtime: &PluginRuntime) -> Result<()> {
    runtime.initialize().await?;
    runtime.register_builtin_plugins().await
        .context("Failed to register built-in plugins")?;

    let loaded = runtime.load_configured_manifests().await
        .context("Failed to load plugin manifests")?;
    if loaded > 0 {
        info!("Loaded {} plugins from manifests", loaded);
    }
    Ok(())
}

pub async fn run_command(runtime: &PluginRuntime, command: &Command, colours: &ColourManager) -> Result<()> {
    match command {
        Command::List { visualizations: false, json: true } => {
            println!("{}", serde_json::to_string_pretty(&runtime.tool_manifest())?);
        }
        Command::List { visualizations: true, json: true } => {
            println!("{}", serde_json::to_string_pretty(&runtime.list_visualizations())?);
        }
        Command::List { visualizations: false, json: false } => {
            let functions = runtime.list_functions();
            println!("{} ({})", colours.highlight("Functions"), functions.len());
            print!("{}", display::functions_table(&functions));
        }
        Command::List { visualizations: true, json: false } => {
            let visualizations = runtime.list_visualizations();
            println!("{} ({})", colours.highlight("Visualizations"), visualizations.len());
            print!("{}", display::visualizations_table(&visualizations));
        }
        Command::Call { qualified_name, params, stats } => {
            let parameters: Value = serde_json::from_str(params)
                .with_context(|| format!("--params is not valid JSON: {}", params))?;

            let result = runtime.execute_function_by_name(qualified_name, parameters).await;
            match result {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(e) => {
                    // main reports the returned error
                    if *stats {
                        print!("{}", display::usage_table(&runtime.get_system_stats().await.execution));
                    }
                    return Err(e).with_context(|| format!("Call to {} failed", qualified_name));
                }
            }

            if *stats {
                print!("{}", display::usage_table(&runtime.get_system_stats().await.execution));
            }
        }
        Command::Stats { json } => {
            let stats = runtime.get_system_stats().await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", display::stats_table(&stats));
            }
        }
    }
    Ok(())
}
