//! Table formatting for plugin listings and statistics

use prettytable::{format, Cell, Row, Table};
use crate::plugin::{ExecutionMetrics, FunctionDescriptor, PluginCounts, VisualizationDescriptor};
use crate::runtime::SystemStats;

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));

    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    // 2-space indent
    table
        .to_string()
        .lines()
        .map(|line| format!("  {}\n", line))
        .collect()
}

fn parameter_summary(parameters: &serde_json::Value) -> String {
    let required: Vec<&str> = parameters["required"]
        .as_array()
        .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
        .unwrap_or_default();

    parameters["properties"]
        .as_object()
        .map(|properties| {
            properties
                .iter()
                .map(|(name, property)| {
                    let kind = property["type"].as_str().unwrap_or("any");
                    if required.contains(&name.as_str()) {
                        format!("{}: {}", name, kind)
                    } else {
                        format!("[{}: {}]", name, kind)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

pub fn functions_table(functions: &[FunctionDescriptor]) -> String {
    let rows: Vec<Vec<String>> = functions
        .iter()
        .map(|f| vec![
            f.name.clone(),
            f.plugin.plugin_type.to_string(),
            parameter_summary(&f.parameters),
            f.description.clone(),
        ])
        .collect();
    format_compact_table(&["Function", "Type", "Parameters", "Description"], &rows)
}

pub fn visualizations_table(visualizations: &[VisualizationDescriptor]) -> String {
    let rows: Vec<Vec<String>> = visualizations
        .iter()
        .map(|v| vec![
            v.id.clone(),
            v.name.clone(),
            v.supported_data_types.join(", "),
            v.description.clone(),
        ])
        .collect();
    format_compact_table(&["Plugin", "Name", "Data Types", "Description"], &rows)
}

fn counts_rows(counts: &PluginCounts) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["plugins".to_string(), counts.total.to_string()]];
    rows.extend(
        counts
            .by_type
            .iter()
            .map(|(plugin_type, count)| vec![format!("  {}", plugin_type), count.to_string()]),
    );
    rows
}

fn execution_rows(execution: &ExecutionMetrics) -> Vec<Vec<String>> {
    vec![
        vec!["executions".to_string(), execution.total_executions.to_string()],
        vec!["  successful".to_string(), execution.successful_executions.to_string()],
        vec!["  failed".to_string(), execution.failed_executions.to_string()],
        vec!["average time (ms)".to_string(), format!("{:.3}", execution.average_execution_time)],
    ]
}

pub fn stats_table(stats: &SystemStats) -> String {
    let mut rows = counts_rows(&stats.plugins);
    rows.extend(execution_rows(&stats.execution));
    rows.push(vec![
        "max concurrent".to_string(),
        stats.resources.admission.max_concurrent_executions.to_string(),
    ]);
    rows.push(vec!["denied".to_string(), stats.resources.admission.total_denied.to_string()]);
    rows.push(vec!["executors".to_string(), stats.resources.registered_executors.to_string()]);
    rows.push(vec!["events published".to_string(), stats.resources.events_published.to_string()]);
    format_compact_table(&["Metric", "Value"], &rows)
}

pub fn usage_table(execution: &ExecutionMetrics) -> String {
    let rows: Vec<Vec<String>> = execution
        .usage_stats
        .iter()
        .map(|(name, usage)| vec![
            name.clone(),
            usage.executions.to_string(),
            usage.errors.to_string(),
            format!("{:.3}", usage.average_time()),
        ])
        .collect();
    format_compact_table(&["Function", "Calls", "Errors", "Avg (ms)"], &rows)
}
