//! Plugin Runtime
//!
//! Owns one registry, admission controller, metrics collector, dispatcher and
//! event bus. Construct it explicitly and share it behind an `Arc`.
//!
//! # Example Usage
//!
//! ```no_run
//! use genome_plugins::runtime::{PluginRuntime, RuntimeConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = PluginRuntime::new(RuntimeConfig::default());
//! runtime.initialize().await?;
//! runtime.register_builtin_plugins().await?;
//!
//! let rc = runtime
//!     .execute_function_by_name("seq-utils.reverseComplement", json!({"sequence": "ATCG"}))
//!     .await?;
//! assert_eq!(rc, json!("CGAT"));
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use config::RuntimeConfig;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use crate::notifications::{DeliveryStats, EventBus, NotificationResult, PluginEvent, Subscriber};
use crate::plugin::admission::{AdmissionController, AdmissionSnapshot};
use crate::plugin::builtin;
use crate::plugin::definition::{
    FunctionDescriptor, PluginDefinition, PluginMetadata, PluginRef, PluginStatus, PluginType,
    VisualizationDescriptor,
};
use crate::plugin::discovery::ManifestDiscovery;
use crate::plugin::dispatcher::FunctionDispatcher;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::executor::{ExecutorTable, FunctionExecutor};
use crate::plugin::metrics::{ExecutionMetrics, MetricsCollector};
use crate::plugin::registry::{PluginCounts, PluginRegistry};

/// Resource usage part of [`SystemStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub admission: AdmissionSnapshot,
    pub registered_executors: usize,
    pub subscribers: usize,
    pub events_published: u64,
    pub event_delivery_failures: u64,
    pub uptime_ms: u64,
}

/// Snapshot returned by [`PluginRuntime::get_system_stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub plugins: PluginCounts,
    pub execution: ExecutionMetrics,
    pub resources: ResourceStats,
}

/// The plugin management and execution runtime
pub struct PluginRuntime {
    config: RuntimeConfig,
    executors: Arc<ExecutorTable>,
    registry: Arc<PluginRegistry>,
    admission: Arc<AdmissionController>,
    metrics: Arc<MetricsCollector>,
    dispatcher: FunctionDispatcher,
    events: EventBus,
    started_at: Instant,
    initialized: AtomicBool,
}

impl PluginRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        let events = EventBus::with_config(config.event_timeout, config.event_stream_capacity);
        let executors = Arc::new(ExecutorTable::new());
        let registry = Arc::new(PluginRegistry::new(Arc::clone(&executors), events.clone()));
        let admission = Arc::new(AdmissionController::new(config.max_concurrent_executions));
        let metrics = Arc::new(MetricsCollector::new());
        let dispatcher = FunctionDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&admission),
            Arc::clone(&metrics),
            events.clone(),
        );

        debug!("Created plugin runtime with {:?}", config);

        Self {
            config,
            executors,
            registry,
            admission,
            metrics,
            dispatcher,
            events,
            started_at: Instant::now(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn executors(&self) -> &Arc<ExecutorTable> {
        &self.executors
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Announce the runtime. Calling it again has no effect.
    pub async fn initialize(&self) -> PluginResult<()> {
        if self.events.is_shutting_down() {
            return Err(PluginError::configuration_error("runtime has been destroyed"));
        }
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!(
            "Plugin runtime initialized (max {} concurrent executions)",
            self.admission.max_concurrent_executions()
        );
        self.post(PluginEvent::system_initialized());
        Ok(())
    }

    /// Announce shutdown and stop the event bus
    pub async fn destroy(&self) {
        if self.events.is_shutting_down() {
            return;
        }
        self.post(PluginEvent::system_destroyed());
        if let Err(e) = self.events.shutdown().await {
            warn!("Event bus shutdown failed: {}", e);
        }
        self.initialized.store(false, Ordering::SeqCst);
        info!("Plugin runtime destroyed");
    }

    pub async fn register(&self, id: &str, definition: PluginDefinition) -> PluginResult<()> {
        self.registry.register(id, definition).await
    }

    /// Make an executor available to definitions and manifests by name
    pub fn register_executor<S: Into<String>>(&self, name: S, executor: Arc<dyn FunctionExecutor>) {
        self.executors.register(name, executor);
    }

    pub async fn execute_function_by_name(&self, qualified_name: &str, parameters: Value) -> PluginResult<Value> {
        self.dispatcher.execute_function_by_name(qualified_name, parameters).await
    }

    pub fn get_plugin(&self, id: &str) -> Option<PluginRef> {
        self.registry.get(id)
    }

    pub fn plugin_metadata(&self, id: &str) -> Option<PluginMetadata> {
        self.registry.metadata(id)
    }

    /// Disable or re-enable a plugin found by id
    pub fn set_plugin_status(&self, id: &str, status: PluginStatus) -> PluginResult<()> {
        let plugin = self.registry.get(id).ok_or_else(|| PluginError::plugin_not_found(id))?;
        self.registry.set_status(plugin.plugin_type(), id, status)
    }

    pub fn list_functions(&self) -> Vec<FunctionDescriptor> {
        self.registry.list_functions()
    }

    pub fn list_visualizations(&self) -> Vec<VisualizationDescriptor> {
        self.registry.list_visualizations()
    }

    /// Function list in tool-calling form: `{name, description, parameters}`
    pub fn tool_manifest(&self) -> Vec<Value> {
        self.list_functions()
            .into_iter()
            .map(|f| json!({ "name": f.name, "description": f.description, "parameters": f.parameters }))
            .collect()
    }

    pub async fn get_system_stats(&self) -> SystemStats {
        let delivery: DeliveryStats = self.events.get_stats();
        SystemStats {
            plugins: self.registry.counts(),
            execution: self.metrics.snapshot(),
            resources: ResourceStats {
                admission: self.admission.snapshot(),
                registered_executors: self.executors.len(),
                subscribers: self.events.subscriber_count().await,
                events_published: delivery.events_published,
                event_delivery_failures: delivery.delivery_failures,
                uptime_ms: self.started_at.elapsed().as_millis() as u64,
            },
        }
    }

    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber<PluginEvent>>) -> NotificationResult<()> {
        self.events.subscribe(subscriber).await
    }

    pub async fn unsubscribe(&self, subscriber_id: &str) -> NotificationResult<()> {
        self.events.unsubscribe(subscriber_id).await
    }

    /// Every event published from now on, as a stream
    pub fn event_stream(&self) -> BroadcastStream<PluginEvent> {
        self.events.stream()
    }

    /// Register the built-in plugins and their executors
    pub async fn register_builtin_plugins(&self) -> PluginResult<()> {
        builtin::register_builtin_executors(&self.executors);
        for id in builtin::get_builtin_plugins() {
            if let Some(definition) = builtin::create_builtin_plugin(id) {
                self.register(id, definition).await?;
            }
        }
        Ok(())
    }

    /// Register every manifest under `dir`. A manifest that fails to register
    /// is logged and skipped; the number registered is returned.
    pub async fn load_manifests(&self, dir: &Path) -> PluginResult<usize> {
        let discovery = ManifestDiscovery::new(dir)?;
        let mut registered = 0;

        for found in discovery.discover().await? {
            let outcome = match found.manifest.into_definition() {
                Ok((id, definition)) => self.register(&id, definition).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => registered += 1,
                Err(e) => warn!("Manifest {} not registered: {}", found.path.display(), e),
            }
        }

        info!("Registered {} plugins from {}", registered, dir.display());
        Ok(registered)
    }

    /// Load manifests from the configured plugin directory, if any
    pub async fn load_configured_manifests(&self) -> PluginResult<usize> {
        match self.config.plugin_dir.clone() {
            Some(dir) => self.load_manifests(&dir).await,
            None => Ok(0),
        }
    }

    pub fn plugins_of_type(&self, plugin_type: PluginType) -> Vec<PluginRef> {
        self.registry.plugins_of_type(plugin_type)
    }

    /// Wait until every event posted so far has reached its subscribers
    pub async fn flush_events(&self) {
        self.events.flush().await;
    }

    fn post(&self, event: PluginEvent) {
        if let Err(e) = self.events.post(event) {
            debug!("Event not published: {}", e);
        }
    }
}

impl Default for PluginRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
