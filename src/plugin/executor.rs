//! Function Executors
//!
//! The callables backing plugin functions, and the table used to resolve
//! executors referenced by name when a plugin is registered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use crate::plugin::context::ExecutionContext;
use crate::plugin::error::{PluginError, PluginResult};

/// Callable backing a plugin function
#[async_trait]
pub trait FunctionExecutor: Send + Sync {
    /// Run the function with an already validated parameter object
    async fn execute(&self, context: &ExecutionContext, parameters: &Value) -> anyhow::Result<Value>;
}

/// Adapter turning a synchronous closure into an executor
pub struct FnExecutor<F> {
    func: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&ExecutionContext, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> FunctionExecutor for FnExecutor<F>
where
    F: Fn(&ExecutionContext, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    async fn execute(&self, context: &ExecutionContext, parameters: &Value) -> anyhow::Result<Value> {
        (self.func)(context, parameters)
    }
}

/// Wrap a synchronous closure as a shared executor
pub fn sync_executor<F>(func: F) -> Arc<dyn FunctionExecutor>
where
    F: Fn(&ExecutionContext, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(FnExecutor::new(func))
}

/// Reference from a function spec to its executor
#[derive(Clone)]
pub enum ExecutorRef {
    /// Name looked up in the executor table at registration time
    Named(String),
    /// Callable supplied directly
    Direct(Arc<dyn FunctionExecutor>),
}

impl ExecutorRef {
    pub fn named<S: Into<String>>(name: S) -> Self {
        ExecutorRef::Named(name.into())
    }

    pub fn direct(executor: Arc<dyn FunctionExecutor>) -> Self {
        ExecutorRef::Direct(executor)
    }

    /// The callable, once the reference has been resolved
    pub fn callable(&self) -> Option<&Arc<dyn FunctionExecutor>> {
        match self {
            ExecutorRef::Direct(executor) => Some(executor),
            ExecutorRef::Named(_) => None,
        }
    }
}

impl fmt::Debug for ExecutorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ExecutorRef::Direct(_) => f.write_str("Direct(<executor>)"),
        }
    }
}

/// Named executors available to plugin definitions and manifests
#[derive(Default)]
pub struct ExecutorTable {
    executors: RwLock<HashMap<String, Arc<dyn FunctionExecutor>>>,
}

impl ExecutorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under a name, replacing any previous entry
    pub fn register<S: Into<String>>(&self, name: S, executor: Arc<dyn FunctionExecutor>) {
        let name = name.into();
        debug!("Registering executor '{}'", name);
        self.executors.write().insert(name, executor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FunctionExecutor>> {
        self.executors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.executors.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.executors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.read().is_empty()
    }

    /// Resolve a reference to a direct callable
    pub fn resolve(&self, executor: &ExecutorRef) -> PluginResult<ExecutorRef> {
        match executor {
            ExecutorRef::Direct(_) => Ok(executor.clone()),
            ExecutorRef::Named(name) => self
                .get(name)
                .map(ExecutorRef::Direct)
                .ok_or_else(|| PluginError::validation(format!("unknown executor '{}'", name))),
        }
    }
}

impl fmt::Debug for ExecutorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorTable").field("executors", &self.names()).finish()
    }
}
