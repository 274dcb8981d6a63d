//! Runtime Event Tests
//!
//! Lifecycle and execution events as observed through subscribers and the
//! event stream.

use std::sync::Arc;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tokio::time::timeout;
use crate::notifications::events::{FUNCTION_ERROR, FUNCTION_EXECUTED, SYSTEM_DESTROYED, SYSTEM_INITIALIZED};
use crate::notifications::{EventFilter, NotificationError, NotificationEvent, NotificationResult, PluginEvent, Subscriber};
use crate::plugin::definition::PluginType;
use crate::runtime::{PluginRuntime, RuntimeConfig};
use super::mock_executors::*;

struct FailingSubscriber;

#[async_trait]
impl Subscriber<PluginEvent> for FailingSubscriber {
    async fn handle_event(&self, _event: PluginEvent) -> NotificationResult<()> {
        Err(NotificationError::Generic("refused".to_string()))
    }

    fn subscriber_id(&self) -> &str {
        "failing"
    }
}

/// Takes half a second over every event before recording it
struct SlowSubscriber {
    inner: Arc<RecordingSubscriber>,
}

#[async_trait]
impl Subscriber<PluginEvent> for SlowSubscriber {
    async fn handle_event(&self, event: PluginEvent) -> NotificationResult<()> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.inner.handle_event(event).await
    }

    fn subscriber_id(&self) -> &str {
        "slow"
    }
}

struct ErrorsOnly {
    inner: Arc<RecordingSubscriber>,
}

#[async_trait]
impl Subscriber<PluginEvent> for ErrorsOnly {
    async fn handle_event(&self, event: PluginEvent) -> NotificationResult<()> {
        self.inner.handle_event(event).await
    }

    fn subscriber_id(&self) -> &str {
        "errors-only"
    }

    fn event_filter(&self) -> EventFilter {
        EventFilter::only([FUNCTION_ERROR])
    }
}

#[tokio::test]
async fn test_lifecycle_events() {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    let observer = RecordingSubscriber::new("observer");
    runtime.subscribe(observer.clone()).await.unwrap();

    runtime.initialize().await.unwrap();
    runtime.initialize().await.unwrap();
    runtime.destroy().await;

    let types: Vec<&str> = observer.events().await.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec![SYSTEM_INITIALIZED, SYSTEM_DESTROYED]);

    assert!(runtime.initialize().await.is_err());
}

#[tokio::test]
async fn test_reverse_complement_emits_one_executed_event() {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    runtime.register_builtin_plugins().await.unwrap();
    let observer = RecordingSubscriber::new("observer");
    runtime.subscribe(observer.clone()).await.unwrap();

    let result = runtime
        .execute_function_by_name("seq-utils.reverseComplement", json!({"sequence": "ATCG"}))
        .await
        .unwrap();
    assert_eq!(result, json!("CGAT"));

    runtime.flush_events().await;
    let executed = observer.events_of_type(FUNCTION_EXECUTED).await;
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].plugin_id(), Some("seq-utils"));
    assert_eq!(executed[0].payload()["result"], json!("CGAT"));
    assert!(executed[0].payload()["executionTime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_failing_subscriber_does_not_affect_dispatch() {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    runtime.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();
    runtime.subscribe(Arc::new(FailingSubscriber)).await.unwrap();
    let observer = RecordingSubscriber::new("observer");
    runtime.subscribe(observer.clone()).await.unwrap();

    let result = runtime.execute_function_by_name("echo.echo", json!({"value": "ok"})).await;
    assert_eq!(result.unwrap(), json!({"value": "ok"}));
    runtime.flush_events().await;
    assert_eq!(observer.events_of_type(FUNCTION_EXECUTED).await.len(), 1);

    let stats = runtime.get_system_stats().await;
    assert!(stats.resources.event_delivery_failures >= 1);
    assert_eq!(stats.execution.successful_executions, 1);
}

#[tokio::test]
async fn test_filtered_subscriber_and_unsubscribe() {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    runtime.register("echo", echo_plugin(PluginType::Function)).await.unwrap();

    let recorder = RecordingSubscriber::new("inner");
    runtime.subscribe(Arc::new(ErrorsOnly { inner: recorder.clone() })).await.unwrap();

    runtime.execute_function_by_name("echo.echo", json!({})).await.unwrap();
    let _ = runtime.execute_function_by_name("echo.echo", json!({"value": 7})).await;
    runtime.flush_events().await;
    assert!(recorder.events().await.is_empty(), "invalid parameters never reach execution");

    runtime.set_plugin_status("echo", crate::plugin::definition::PluginStatus::Disabled).unwrap();
    let _ = runtime.execute_function_by_name("echo.echo", json!({})).await;
    runtime.flush_events().await;
    assert!(recorder.events().await.is_empty());

    runtime.unsubscribe("errors-only").await.unwrap();
    assert!(runtime.unsubscribe("errors-only").await.is_err());
}

#[tokio::test]
async fn test_event_stream_sees_executions() {
    let runtime = PluginRuntime::new(RuntimeConfig::default().with_max_concurrent_executions(2));
    runtime.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();
    let mut stream = runtime.event_stream();

    runtime.execute_function_by_name("echo.echo", json!({"value": "a"})).await.unwrap();

    let event = timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(event.event_type(), FUNCTION_EXECUTED);
    assert_eq!(event.payload()["parameters"], json!({"value": "a"}));
}

#[tokio::test]
async fn test_slow_subscriber_does_not_delay_dispatch() {
    let runtime = PluginRuntime::new(RuntimeConfig::default());
    runtime.register("echo", echo_plugin(PluginType::Utility)).await.unwrap();
    let recorder = RecordingSubscriber::new("inner");
    runtime.subscribe(Arc::new(SlowSubscriber { inner: recorder.clone() })).await.unwrap();

    let start = Instant::now();
    let result = runtime.execute_function_by_name("echo.echo", json!({"value": 0})).await;
    let elapsed = start.elapsed();

    assert_eq!(result.unwrap(), json!({"value": 0}));
    assert!(elapsed < Duration::from_millis(200), "dispatch returned after {:?}", elapsed);
    assert!(recorder.events_of_type(FUNCTION_EXECUTED).await.is_empty());

    runtime.flush_events().await;
    assert_eq!(recorder.events_of_type(FUNCTION_EXECUTED).await.len(), 1);
}
