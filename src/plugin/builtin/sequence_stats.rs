//! Protein Statistics Plugin

use serde_json::json;
use super::str_param;
use crate::plugin::definition::{FunctionSpec, PluginDefinition, PluginType};
use crate::plugin::executor::{sync_executor, ExecutorRef};
use crate::plugin::schema::{ParameterSchema, SchemaType};

pub const PLUGIN_ID: &str = "sequence-stats";

pub fn definition() -> PluginDefinition {
    let protein_schema = ParameterSchema::new()
        .required_property("protein", SchemaType::String, "Protein sequence (one-letter codes)");

    PluginDefinition::new(
        PluginType::Function,
        "Sequence Statistics",
        "Composition statistics for protein sequences",
        "1.0.0",
    )
    .with_category("analysis")
    .with_function("aminoAcidComposition", FunctionSpec::new(
        "Count and percentage of each residue",
        protein_schema.clone(),
        ExecutorRef::direct(sync_executor(|ctx, params| {
            let protein = str_param(params, "protein")?;
            let composition: serde_json::Map<String, serde_json::Value> = ctx
                .amino_acid_composition(protein)
                .into_iter()
                .map(|(aa, count)| -> serde_json::Result<(String, serde_json::Value)> {
                    Ok((aa.to_string(), serde_json::to_value(count)?))
                })
                .collect::<serde_json::Result<_>>()?;
            Ok(json!({ "composition": composition }))
        })),
    ))
    .with_function("residueClasses", FunctionSpec::new(
        "Hydrophobic, charged and polar residue fractions",
        protein_schema,
        ExecutorRef::direct(sync_executor(|ctx, params| {
            let protein = str_param(params, "protein")?;
            Ok(serde_json::to_value(ctx.residue_classes(protein))?)
        })),
    ))
}
