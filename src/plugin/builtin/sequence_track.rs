//! Sequence Track Visualization
//!
//! Declares a render contract for DNA and protein tracks. Rendering belongs to
//! the host; the executor only prepares windowed GC data for it.

use anyhow::ensure;
use serde_json::json;
use super::str_param;
use crate::plugin::definition::{PluginDefinition, PluginType, Priority};
use crate::plugin::executor::{sync_executor, ExecutorRef, ExecutorTable};

pub const PLUGIN_ID: &str = "sequence-track";

const RENDER: &str = "sequence-track.render";
const DEFAULT_WINDOW: u64 = 100;

pub fn register_executors(table: &ExecutorTable) {
    table.register(RENDER, sync_executor(|ctx, params| {
        let sequence = crate::sequence::normalise(str_param(params, "sequence")?);
        let window = params.get("window").and_then(|w| w.as_u64()).unwrap_or(DEFAULT_WINDOW);
        ensure!(window > 0, "window must be greater than 0");

        let bases: Vec<char> = sequence.chars().collect();
        let windows: Vec<_> = bases
            .chunks(window as usize)
            .enumerate()
            .map(|(i, chunk)| {
                let chunk: String = chunk.iter().collect();
                json!({ "start": i as u64 * window, "gcContent": ctx.gc_content(&chunk) })
            })
            .collect();

        Ok(json!({ "length": bases.len(), "window": window, "track": windows }))
    }));
}

pub fn definition() -> PluginDefinition {
    PluginDefinition::new(
        PluginType::Visualization,
        "Sequence Track",
        "Linear track of a sequence with windowed GC content",
        "1.0.0",
    )
    .with_category("visualization")
    .with_priority(Priority::Low)
    .with_supported_data_types(["dna", "protein"])
    .with_executor(ExecutorRef::named(RENDER))
}
