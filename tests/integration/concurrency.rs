//! Concurrency Integration Tests
//!
//! Admission control under overlapping calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{json, Value};

use genome_plugins::plugin::admission::CONCURRENCY_LIMIT_REACHED;
use genome_plugins::plugin::{
    ExecutionContext, ExecutorRef, FunctionExecutor, FunctionSpec, ParameterSchema, PluginDefinition,
    PluginError, PluginType,
};
use genome_plugins::runtime::{PluginRuntime, RuntimeConfig};

#[derive(Default)]
struct Sleeper {
    running: AtomicUsize,
    max_running: AtomicUsize,
}

#[async_trait]
impl FunctionExecutor for Sleeper {
    async fn execute(&self, _context: &ExecutionContext, parameters: &Value) -> anyhow::Result<Value> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        let millis = parameters.get("millis").and_then(Value::as_u64).unwrap_or(100);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(json!(millis))
    }
}

async fn runtime_with_sleeper(max_concurrent: usize) -> (Arc<PluginRuntime>, Arc<Sleeper>) {
    let runtime = Arc::new(PluginRuntime::new(
        RuntimeConfig::default().with_max_concurrent_executions(max_concurrent),
    ));
    let sleeper = Arc::new(Sleeper::default());
    let executor: Arc<dyn FunctionExecutor> = sleeper.clone();

    let definition = PluginDefinition::new(PluginType::Utility, "Sleeper", "Sleeps for a while", "1.0.0")
        .with_function("sleep", FunctionSpec::new(
            "Sleep for `millis` milliseconds",
            ParameterSchema::new().property("millis", genome_plugins::plugin::SchemaType::Number, "Delay"),
            ExecutorRef::direct(executor),
        ));
    runtime.register("sleeper", definition).await.unwrap();
    (runtime, sleeper)
}

#[tokio::test]
async fn single_slot_denies_overlapping_call() {
    let (runtime, sleeper) = runtime_with_sleeper(1).await;

    let slow = runtime.execute_function_by_name("sleeper.sleep", json!({"millis": 200}));
    let fast = async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        runtime.execute_function_by_name("sleeper.sleep", json!({"millis": 1})).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), json!(200));
    assert_eq!(fast, Err(PluginError::execution_denied(CONCURRENCY_LIMIT_REACHED)));
    assert_eq!(sleeper.max_running.load(Ordering::SeqCst), 1);

    let stats = runtime.get_system_stats().await;
    assert_eq!(stats.resources.admission.total_denied, 1);
    assert_eq!(stats.resources.admission.active_executions, 0);

    // slot is free once the first call finished
    assert!(runtime.execute_function_by_name("sleeper.sleep", json!({"millis": 1})).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn active_executions_never_exceed_limit() {
    let limit = 3;
    let (runtime, sleeper) = runtime_with_sleeper(limit).await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move {
                runtime.execute_function_by_name("sleeper.sleep", json!({"millis": 50})).await
            })
        })
        .collect();

    let mut granted = 0u64;
    let mut denied = 0u64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(PluginError::ExecutionDenied { .. }) => denied += 1,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    assert!(granted >= 1);
    assert!(sleeper.max_running.load(Ordering::SeqCst) <= limit);

    let stats = runtime.get_system_stats().await;
    assert_eq!(stats.resources.admission.total_granted, granted);
    assert_eq!(stats.resources.admission.total_denied, denied);
    assert_eq!(stats.resources.admission.active_executions, 0);
    assert_eq!(stats.execution.total_executions, 12);
    assert_eq!(stats.execution.failed_executions, denied);
}
