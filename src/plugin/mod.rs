//! Plugin System Module
//!
//! Typed plugin registry, schema validation, admission control and function
//! dispatch for genomics extension modules.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use genome_plugins::notifications::EventBus;
//! use genome_plugins::plugin::{
//!     sync_executor, ExecutorRef, ExecutorTable, FunctionSpec, ParameterSchema, PluginDefinition,
//!     PluginRegistry, PluginType, SchemaType,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = PluginRegistry::new(Arc::new(ExecutorTable::new()), EventBus::new());
//!
//! let definition = PluginDefinition::new(PluginType::Utility, "Echo", "Returns its input", "1.0.0")
//!     .with_function("echo", FunctionSpec::new(
//!         "Echo the parameters",
//!         ParameterSchema::new().required_property("value", SchemaType::String, "Value to echo"),
//!         ExecutorRef::direct(sync_executor(|_, params| Ok(params.clone()))),
//!     ));
//! registry.register("echo", definition).await?;
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod builtin;
pub mod context;
pub mod definition;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod metrics;
pub mod registry;
pub mod schema;

#[cfg(test)]
pub mod tests;

// Re-export core types for easier access
pub use admission::{
    AdmissionController, AdmissionDecision, AdmissionSnapshot, ExecutionId, ExecutionOutcome, ExecutionPermit,
};
pub use context::ExecutionContext;
pub use definition::{
    FunctionDescriptor, FunctionSpec, PluginDefinition, PluginMetadata, PluginRef, PluginStatus,
    PluginSummary, PluginType, Priority, RegisteredPlugin, VisualizationDescriptor,
};
pub use dispatcher::{parse_qualified_name, FunctionDispatcher};
pub use error::{PluginError, PluginResult};
pub use executor::{sync_executor, ExecutorRef, ExecutorTable, FnExecutor, FunctionExecutor};
pub use manifest::{FunctionManifest, PluginManifest};
pub use metrics::{ExecutionMetrics, MetricsCollector, UsageStats};
pub use registry::{PluginCounts, PluginRegistry};
pub use schema::{validate_definition, validate_parameters, ParameterSchema, PropertySchema, SchemaType};
