//! Dispatcher Tests

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use crate::notifications::events::{FUNCTION_ERROR, FUNCTION_EXECUTED};
use crate::notifications::{EventBus, EventFilter, NotificationResult, PluginEvent, Subscriber};
use crate::plugin::admission::{AdmissionController, CONCURRENCY_LIMIT_REACHED};
use crate::plugin::definition::{PluginStatus, PluginType};
use crate::plugin::dispatcher::FunctionDispatcher;
use crate::plugin::error::PluginError;
use crate::plugin::executor::{ExecutorTable, FunctionExecutor};
use crate::plugin::metrics::MetricsCollector;
use crate::plugin::registry::PluginRegistry;
use super::mock_executors::*;

struct Harness {
    registry: Arc<PluginRegistry>,
    admission: Arc<AdmissionController>,
    metrics: Arc<MetricsCollector>,
    dispatcher: Arc<FunctionDispatcher>,
    events: EventBus,
    observer: Arc<RecordingSubscriber>,
}

async fn harness(max_concurrent: usize) -> Harness {
    let events = EventBus::new();
    let observer = RecordingSubscriber::new("observer");
    events.subscribe(observer.clone()).await.unwrap();

    let registry = Arc::new(PluginRegistry::new(Arc::new(ExecutorTable::new()), events.clone()));
    let admission = Arc::new(AdmissionController::new(max_concurrent));
    let metrics = Arc::new(MetricsCollector::new());
    let dispatcher = Arc::new(FunctionDispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&admission),
        Arc::clone(&metrics),
        events.clone(),
    ));

    Harness { registry, admission, metrics, dispatcher, events, observer }
}

#[tokio::test]
async fn test_lookup_failures_touch_nothing() {
    let h = harness(2).await;
    h.registry.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();

    assert!(matches!(
        h.dispatcher.execute_function_by_name("unknown.foo", json!({})).await,
        Err(PluginError::PluginNotFound { ref plugin_id }) if plugin_id == "unknown"
    ));
    assert!(matches!(
        h.dispatcher.execute_function_by_name("echo.unknownFn", json!({})).await,
        Err(PluginError::FunctionNotFound { .. })
    ));
    assert!(matches!(
        h.dispatcher.execute_function_by_name("noDot", json!({})).await,
        Err(PluginError::InvalidCallFormat { .. })
    ));

    assert_eq!(h.metrics.snapshot().total_executions, 0);
    assert_eq!(h.admission.snapshot().total_granted, 0);
    assert_eq!(h.registry.metadata("echo").unwrap().execution_count, 0);
    h.events.flush().await;
    assert!(h.observer.events_of_type(FUNCTION_ERROR).await.is_empty());
}

#[tokio::test]
async fn test_invalid_parameters_rejected_before_admission() {
    let h = harness(2).await;
    let executor = Arc::new(CountingExecutor::new());
    h.registry
        .register("region", plugin_with_functions(PluginType::Function, &["fetch"], executor.clone()))
        .await
        .unwrap();

    let missing_start = h.dispatcher
        .execute_function_by_name("region.fetch", json!({"chromosome": "chr1", "end": 200}))
        .await;
    assert!(matches!(missing_start, Err(PluginError::InvalidParameters { ref message }) if message.contains("start")));

    let string_start = h.dispatcher
        .execute_function_by_name("region.fetch", json!({"chromosome": "chr1", "start": "100", "end": 200}))
        .await;
    assert!(matches!(string_start, Err(PluginError::InvalidParameters { .. })));

    assert_eq!(executor.calls(), 0);
    assert_eq!(h.admission.snapshot().total_granted, 0);
    assert_eq!(h.metrics.snapshot().total_executions, 0);
}

#[tokio::test]
async fn test_success_updates_metrics_metadata_and_emits_once() {
    let h = harness(2).await;
    let executor = Arc::new(CountingExecutor::new());
    h.registry
        .register("region", plugin_with_functions(PluginType::Function, &["fetch"], executor.clone()))
        .await
        .unwrap();

    let result = h.dispatcher.execute_function_by_name("region.fetch", region_params()).await.unwrap();
    assert_eq!(result["call"], 1);

    let metrics = h.metrics.snapshot();
    assert_eq!(metrics.total_executions, 1);
    assert_eq!(metrics.successful_executions, 1);
    assert_eq!(metrics.usage_stats["region.fetch"].executions, 1);

    let metadata = h.registry.metadata("region").unwrap();
    assert_eq!(metadata.status, PluginStatus::Active);
    assert_eq!(metadata.success_count, 1);
    assert!(metadata.last_executed.is_some());

    assert_eq!(h.admission.active_executions(), 0);

    h.events.flush().await;
    let executed = h.observer.events_of_type(FUNCTION_EXECUTED).await;
    assert_eq!(executed.len(), 1);
    match &executed[0] {
        PluginEvent::FunctionExecuted { plugin_id, function_name, parameters, result, .. } => {
            assert_eq!(plugin_id, "region");
            assert_eq!(function_name, "fetch");
            assert_eq!(parameters, &region_params());
            assert_eq!(result["call"], 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_executor_failures_are_counted_and_returned() {
    let h = harness(4).await;
    let executor = Arc::new(CountingExecutor::failing_every(3));
    h.registry
        .register("flaky", plugin_with_functions(PluginType::Utility, &["run"], executor.clone()))
        .await
        .unwrap();

    let n = 9;
    let mut failures = 0;
    for _ in 0..n {
        match h.dispatcher.execute_function_by_name("flaky.run", region_params()).await {
            Ok(_) => {}
            Err(PluginError::ExecutorError { plugin_id, function_name, .. }) => {
                assert_eq!((plugin_id.as_str(), function_name.as_str()), ("flaky", "run"));
                failures += 1;
            }
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert_eq!(failures, 3);

    let metrics = h.metrics.snapshot();
    assert_eq!(metrics.total_executions, n);
    assert_eq!(metrics.failed_executions, failures);
    assert_eq!(metrics.total_executions, metrics.successful_executions + metrics.failed_executions);
    assert_eq!(metrics.usage_stats["flaky.run"].executions, n);
    assert_eq!(metrics.usage_stats["flaky.run"].errors, failures);

    let metadata = h.registry.metadata("flaky").unwrap();
    assert_eq!(metadata.execution_count, metadata.success_count + metadata.error_count);
    assert_eq!(metadata.error_count, failures);

    let admission = h.admission.snapshot();
    assert_eq!(admission.active_executions, 0);
    assert_eq!(admission.total_released, n);
    assert_eq!(admission.released_with_error, failures);

    h.events.flush().await;
    assert_eq!(h.observer.events_of_type(FUNCTION_ERROR).await.len(), failures as usize);
    assert_eq!(h.observer.events_of_type(FUNCTION_EXECUTED).await.len(), (n - failures) as usize);
}

#[tokio::test]
async fn test_panicking_executor_releases_slot() {
    let h = harness(1).await;
    h.registry
        .register("boom", plugin_with_functions(PluginType::Function, &["go"], Arc::new(PanickingExecutor)))
        .await
        .unwrap();

    let result = h.dispatcher.execute_function_by_name("boom.go", region_params()).await;
    assert!(matches!(result, Err(PluginError::ExecutorError { ref message, .. }) if message.contains("panicked")));

    assert_eq!(h.admission.active_executions(), 0);
    assert_eq!(h.metrics.snapshot().failed_executions, 1);

    // the only slot is free again
    let again = h.dispatcher.execute_function_by_name("boom.go", region_params()).await;
    assert!(matches!(again, Err(PluginError::ExecutorError { .. })));
}

#[tokio::test]
async fn test_concurrency_limit_denies_second_call() {
    let h = harness(1).await;
    let slow = Arc::new(SlowExecutor::new(Duration::from_millis(150)));
    let executor: Arc<dyn FunctionExecutor> = slow.clone();
    h.registry
        .register("slow", plugin_with_functions(PluginType::Function, &["wait"], executor))
        .await
        .unwrap();

    let first = {
        let dispatcher = Arc::clone(&h.dispatcher);
        tokio::spawn(async move { dispatcher.execute_function_by_name("slow.wait", region_params()).await })
    };
    let second = {
        let dispatcher = Arc::clone(&h.dispatcher);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            dispatcher.execute_function_by_name("slow.wait", region_params()).await
        })
    };

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(first.is_ok());
    assert_eq!(second, Err(PluginError::execution_denied(CONCURRENCY_LIMIT_REACHED)));
    assert_eq!(slow.max_running(), 1);

    let metrics = h.metrics.snapshot();
    assert_eq!(metrics.total_executions, 2);
    assert_eq!(metrics.failed_executions, 1);

    h.events.flush().await;
    let errors = h.observer.events_of_type(FUNCTION_ERROR).await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], PluginEvent::FunctionError { error, .. } if error.contains(CONCURRENCY_LIMIT_REACHED)));
}

#[tokio::test]
async fn test_disabled_plugin_is_not_dispatched() {
    let h = harness(2).await;
    h.registry.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();
    h.registry.set_status(PluginType::Utility, "echo", PluginStatus::Disabled).unwrap();

    let result = h.dispatcher.execute_function_by_name("echo.echo", json!({"value": "x"})).await;
    assert_eq!(result, Err(PluginError::plugin_disabled("echo")));
    assert_eq!(h.metrics.snapshot().total_executions, 0);

    h.registry.set_status(PluginType::Utility, "echo", PluginStatus::Active).unwrap();
    let result = h.dispatcher.execute_function_by_name("echo.echo", json!({"value": "x"})).await;
    assert_eq!(result.unwrap(), json!({"value": "x"}));
}

#[tokio::test]
async fn test_null_parameters_are_an_empty_object() {
    let h = harness(1).await;
    h.registry.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();

    let result = h.dispatcher.execute_function_by_name("echo.echo", serde_json::Value::Null).await;
    assert_eq!(result.unwrap(), json!({}));

    let not_object = h.dispatcher.execute_function_by_name("echo.echo", json!([1, 2])).await;
    assert!(matches!(not_object, Err(PluginError::InvalidParameters { .. })));
}

#[tokio::test]
async fn test_cancelled_call_releases_slot() {
    let h = harness(1).await;
    let slow = Arc::new(SlowExecutor::new(Duration::from_millis(200)));
    let executor: Arc<dyn FunctionExecutor> = slow.clone();
    h.registry
        .register("slow", plugin_with_functions(PluginType::Function, &["wait"], executor))
        .await
        .unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        h.dispatcher.execute_function_by_name("slow.wait", region_params()),
    )
    .await;
    assert!(abandoned.is_err(), "call should still be running when the timeout fires");

    let admission = h.admission.snapshot();
    assert_eq!(admission.active_executions, 0);
    assert_eq!(admission.total_released, 1);
    assert_eq!(admission.released_with_error, 1);

    // the only slot is usable again
    let short = Arc::new(CountingExecutor::new());
    h.registry
        .register("quick", plugin_with_functions(PluginType::Function, &["run"], short.clone()))
        .await
        .unwrap();
    assert!(h.dispatcher.execute_function_by_name("quick.run", region_params()).await.is_ok());
    assert_eq!(short.calls(), 1);
}

/// Reads the shared counters at the moment an execution event is delivered
struct CounterSnapshots {
    plugin_id: String,
    metrics: Arc<MetricsCollector>,
    registry: Arc<PluginRegistry>,
    seen: Mutex<Vec<(&'static str, u64, u64)>>,
}

#[async_trait]
impl Subscriber<PluginEvent> for CounterSnapshots {
    async fn handle_event(&self, event: PluginEvent) -> NotificationResult<()> {
        use crate::notifications::NotificationEvent;
        let total = self.metrics.snapshot().total_executions;
        let count = self.registry.metadata(&self.plugin_id).map(|m| m.execution_count).unwrap_or(0);
        self.seen.lock().await.push((event.event_type(), total, count));
        Ok(())
    }

    fn subscriber_id(&self) -> &str {
        "counter-snapshots"
    }

    fn event_filter(&self) -> EventFilter {
        EventFilter::only([FUNCTION_EXECUTED, FUNCTION_ERROR])
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_follow_metrics_and_metadata() {
    let h = harness(2).await;
    h.registry
        .register("flaky", plugin_with_functions(PluginType::Utility, &["run"], Arc::new(CountingExecutor::failing_every(2))))
        .await
        .unwrap();
    let snapshots = Arc::new(CounterSnapshots {
        plugin_id: "flaky".to_string(),
        metrics: Arc::clone(&h.metrics),
        registry: Arc::clone(&h.registry),
        seen: Mutex::new(Vec::new()),
    });
    h.events.subscribe(snapshots.clone()).await.unwrap();

    assert!(h.dispatcher.execute_function_by_name("flaky.run", region_params()).await.is_ok());
    h.events.flush().await;
    assert!(h.dispatcher.execute_function_by_name("flaky.run", region_params()).await.is_err());
    h.events.flush().await;

    let seen = snapshots.seen.lock().await.clone();
    assert_eq!(seen, vec![(FUNCTION_EXECUTED, 1, 1), (FUNCTION_ERROR, 2, 2)]);
}

#[tokio::test]
async fn test_unresolved_executor_never_reaches_admission() {
    use crate::plugin::definition::{FunctionSpec, PluginDefinition};
    use crate::plugin::executor::ExecutorRef;

    let h = harness(1).await;
    let definition = PluginDefinition::new(PluginType::Utility, "Named", "Named executor", "1.0.0")
        .with_function("run", FunctionSpec::new("run", region_schema(), ExecutorRef::named("nowhere.run")));
    assert!(h.registry.register("named", definition).await.is_err());

    let result = h.dispatcher.execute_function_by_name("named.run", region_params()).await;
    assert_eq!(result, Err(PluginError::plugin_not_found("named")));

    let admission = h.admission.snapshot();
    assert_eq!(admission.total_granted, 0);
    assert_eq!(admission.total_released, 0);
    assert_eq!(h.metrics.snapshot().total_executions, 0);
}
