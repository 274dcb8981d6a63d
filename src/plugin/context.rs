//! Execution Context
//!
//! Context handed to an executor for a single admitted call. Identifies the
//! call and exposes the sequence helpers every executor may rely on.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use crate::plugin::admission::ExecutionId;
use crate::plugin::definition::Priority;
use crate::sequence::{self, CodonUsage, ResidueClasses, ResidueCount};

/// Context provided to executors during a call
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    plugin_id: String,
    function_name: String,
    execution_id: ExecutionId,
    priority: Priority,
    started_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new<P, F>(plugin_id: P, function_name: F, execution_id: ExecutionId, priority: Priority) -> Self
    where
        P: Into<String>,
        F: Into<String>,
    {
        Self {
            plugin_id: plugin_id.into(),
            function_name: function_name.into(),
            execution_id,
            priority,
            started_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(plugin_id: &str, function_name: &str, priority: Priority) -> Self {
        Self::new(plugin_id, function_name, ExecutionId::new(), priority)
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// `pluginId.functionName` of the running call
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.plugin_id, self.function_name)
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    // Sequence helpers

    pub fn gc_content(&self, sequence: &str) -> f64 {
        sequence::gc_content(sequence)
    }

    pub fn reverse_complement(&self, sequence: &str) -> String {
        sequence::reverse_complement(sequence)
    }

    pub fn translate(&self, sequence: &str, to_stop: bool) -> String {
        sequence::translate(sequence, to_stop)
    }

    pub fn codon_usage(&self, sequence: &str) -> Vec<CodonUsage> {
        sequence::codon_usage(sequence)
    }

    pub fn amino_acid_composition(&self, protein: &str) -> BTreeMap<char, ResidueCount> {
        sequence::amino_acid_composition(protein)
    }

    pub fn residue_classes(&self, protein: &str) -> ResidueClasses {
        sequence::residue_classes(protein)
    }
}
