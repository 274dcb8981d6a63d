//! Sequence Utility Plugin
//!
//! Everyday nucleotide operations. Executors are registered by name and the
//! definition refers to them through the executor table.

use anyhow::ensure;
use serde_json::json;
use super::{bool_param, str_param};
use crate::plugin::definition::{FunctionSpec, PluginDefinition, PluginType, Priority};
use crate::plugin::executor::{sync_executor, ExecutorRef, ExecutorTable};
use crate::plugin::schema::{ParameterSchema, SchemaType};

pub const PLUGIN_ID: &str = "seq-utils";

const REVERSE_COMPLEMENT: &str = "seq-utils.reverseComplement";
const GC_CONTENT: &str = "seq-utils.gcContent";
const TRANSLATE: &str = "seq-utils.translate";
const CODON_USAGE: &str = "seq-utils.codonUsage";

fn sequence_schema() -> ParameterSchema {
    ParameterSchema::new().required_property("sequence", SchemaType::String, "Nucleotide sequence")
}

pub fn register_executors(table: &ExecutorTable) {
    table.register(REVERSE_COMPLEMENT, sync_executor(|ctx, params| {
        let sequence = str_param(params, "sequence")?;
        Ok(json!(ctx.reverse_complement(sequence)))
    }));

    table.register(GC_CONTENT, sync_executor(|ctx, params| {
        let sequence = str_param(params, "sequence")?;
        Ok(json!({
            "gcContent": ctx.gc_content(sequence),
            "length": crate::sequence::normalise(sequence).len(),
        }))
    }));

    table.register(TRANSLATE, sync_executor(|ctx, params| {
        let sequence = str_param(params, "sequence")?;
        ensure!(sequence.chars().filter(|c| !c.is_whitespace()).count() >= 3, "sequence is shorter than one codon");
        let protein = ctx.translate(sequence, bool_param(params, "toStop", false));
        Ok(json!({ "protein": protein, "length": protein.len() }))
    }));

    table.register(CODON_USAGE, sync_executor(|ctx, params| {
        let sequence = str_param(params, "sequence")?;
        Ok(serde_json::to_value(ctx.codon_usage(sequence))?)
    }));
}

pub fn definition() -> PluginDefinition {
    PluginDefinition::new(
        PluginType::Utility,
        "Sequence Utilities",
        "Reverse complement, GC content, translation and codon usage",
        "1.0.0",
    )
    .with_category("sequence")
    .with_priority(Priority::High)
    .with_function("reverseComplement", FunctionSpec::new(
        "Reverse complement of a DNA sequence",
        sequence_schema(),
        ExecutorRef::named(REVERSE_COMPLEMENT),
    ))
    .with_function("gcContent", FunctionSpec::new(
        "GC content of a sequence as a percentage",
        sequence_schema(),
        ExecutorRef::named(GC_CONTENT),
    ))
    .with_function("translate", FunctionSpec::new(
        "Translate a coding sequence with the standard genetic code",
        sequence_schema().property("toStop", SchemaType::Boolean, "Stop at the first stop codon"),
        ExecutorRef::named(TRANSLATE),
    ))
    .with_function("codonUsage", FunctionSpec::new(
        "Relative synonymous codon usage",
        sequence_schema(),
        ExecutorRef::named(CODON_USAGE),
    ))
}
