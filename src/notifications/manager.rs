//! Async Notification Manager
//!
//! Routes published events to registered subscribers and to any broadcast
//! stream listeners. A failing, panicking or slow subscriber is logged and
//! counted but never stops delivery to the others. Posted events are
//! delivered by a background task so publishers never wait on handlers.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use futures::FutureExt;
use log::{debug, error, warn};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::timeout;
use tokio_stream::wrappers::BroadcastStream;

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::events::NotificationEvent;
use crate::notifications::traits::{DeliveryStats, Subscriber};

/// Default buffer of the broadcast stream
const DEFAULT_STREAM_CAPACITY: usize = 256;

/// Statistics for individual subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriberStats {
    pub events_received: u64,
    pub events_processed: u64,
    pub processing_failures: u64,
    pub total_processing_time_us: u64,
    pub last_event_at: Option<SystemTime>,
}

struct SubscriberInfo<T>
where
    T: NotificationEvent
{
    subscriber: Arc<dyn Subscriber<T>>,
    stats: Mutex<SubscriberStats>,
}

/// Work item of the background delivery task
enum QueuedDelivery<T> {
    Event(T),
    Flush(oneshot::Sender<()>),
}

/// Generic async notification manager
pub struct AsyncNotificationManager<T>
where
    T: NotificationEvent
{
    subscribers: Arc<RwLock<HashMap<String, Arc<SubscriberInfo<T>>>>>,
    global_stats: Arc<Mutex<DeliveryStats>>,
    sender: broadcast::Sender<T>,
    default_timeout: Duration,
    shutdown: Arc<AtomicBool>,
    queue: Arc<Mutex<Option<mpsc::UnboundedSender<QueuedDelivery<T>>>>>,
}

impl<T> AsyncNotificationManager<T>
where
    T: NotificationEvent
{
    /// Create a new notification manager
    pub fn new() -> Self {
        Self::with_config(Duration::from_secs(5), DEFAULT_STREAM_CAPACITY)
    }

    /// Create a manager with a per-subscriber delivery timeout and stream buffer size
    pub fn with_config(default_timeout: Duration, stream_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(stream_capacity.max(1));
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            global_stats: Arc::new(Mutex::new(DeliveryStats::default())),
            sender,
            default_timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
            queue: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Subscribe a component to receive events
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) -> NotificationResult<()> {
        if self.is_shutting_down() {
            return Err(NotificationError::SystemShutdown);
        }

        let subscriber_id = subscriber.subscriber_id().to_string();
        let mut subscribers = self.subscribers.write().await;

        if subscribers.contains_key(&subscriber_id) {
            return Err(NotificationError::subscriber_already_exists(subscriber_id));
        }

        subscribers.insert(subscriber_id.clone(), Arc::new(SubscriberInfo {
            subscriber,
            stats: Mutex::new(SubscriberStats::default()),
        }));
        debug!("Subscribed '{}' to notifications", subscriber_id);

        Ok(())
    }

    /// Unsubscribe a component
    pub async fn unsubscribe(&self, subscriber_id: &str) -> NotificationResult<()> {
        let mut subscribers = self.subscribers.write().await;

        if subscribers.remove(subscriber_id).is_some() {
            debug!("Unsubscribed '{}' from notifications", subscriber_id);
            Ok(())
        } else {
            Err(NotificationError::subscriber_not_found(subscriber_id))
        }
    }

    /// Receive every published event as a stream. Slow readers may observe
    /// `Lagged` items when the buffer overflows.
    pub fn stream(&self) -> BroadcastStream<T> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Deliver an event to one subscriber, isolating errors, panics and timeouts
    async fn deliver_to_subscriber(info: &SubscriberInfo<T>, event: &T, timeout_duration: Duration) -> NotificationResult<()> {
        let subscriber_id = info.subscriber.subscriber_id().to_string();

        {
            let mut stats = info.stats.lock();
            stats.events_received += 1;
            stats.last_event_at = Some(SystemTime::now());
        }

        let start_time = Instant::now();
        let handling = AssertUnwindSafe(info.subscriber.handle_event(event.clone())).catch_unwind();
        let delivery_result = timeout(timeout_duration, handling).await;
        let processing_time = start_time.elapsed();

        let mut stats = info.stats.lock();
        stats.total_processing_time_us += processing_time.as_micros() as u64;

        match delivery_result {
            Ok(Ok(Ok(()))) => {
                stats.events_processed += 1;
                debug!("Delivered {} to '{}' in {:?}", event.event_type(), subscriber_id, processing_time);
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                stats.processing_failures += 1;
                error!("Subscriber '{}' failed to process {}: {}", subscriber_id, event.event_type(), e);
                Err(NotificationError::delivery_failed(subscriber_id, e.to_string()))
            }
            Ok(Err(_panic)) => {
                stats.processing_failures += 1;
                error!("Subscriber '{}' panicked while handling {}", subscriber_id, event.event_type());
                Err(NotificationError::delivery_failed(subscriber_id, "subscriber panicked"))
            }
            Err(_) => {
                stats.processing_failures += 1;
                error!("Timeout delivering {} to subscriber '{}'", event.event_type(), subscriber_id);
                Err(NotificationError::timeout("event_delivery", timeout_duration.as_millis() as u64))
            }
        }
    }

    /// Deliver one event to every interested subscriber in turn
    async fn deliver_all(
        subscribers: &RwLock<HashMap<String, Arc<SubscriberInfo<T>>>>,
        global_stats: &Mutex<DeliveryStats>,
        timeout_duration: Duration,
        event: &T,
    ) {
        // Deliver outside the lock so handlers may subscribe or publish
        let targets: Vec<Arc<SubscriberInfo<T>>> = {
            let subscribers = subscribers.read().await;
            subscribers
                .values()
                .filter(|info| info.subscriber.should_receive(event))
                .cloned()
                .collect()
        };

        let start_time = Instant::now();
        let mut delivery_count = 0u64;
        let mut failure_count = 0u64;

        for info in &targets {
            match Self::deliver_to_subscriber(info, event, timeout_duration).await {
                Ok(()) => delivery_count += 1,
                Err(e) => {
                    failure_count += 1;
                    warn!("Failed to deliver event: {}", e);
                }
            }
        }

        let total_time = start_time.elapsed();
        {
            let mut global_stats = global_stats.lock();
            global_stats.events_delivered += delivery_count;
            global_stats.delivery_failures += failure_count;
            if delivery_count > 0 {
                let avg_time = total_time.as_micros() as u64 / delivery_count;
                global_stats.avg_delivery_time_us = if global_stats.avg_delivery_time_us == 0 {
                    avg_time
                } else {
                    (global_stats.avg_delivery_time_us + avg_time) / 2
                };
            }
        }

        debug!(
            "Delivered {} to {} subscribers ({} successful, {} failed) in {:?}",
            event.event_type(), targets.len(), delivery_count, failure_count, total_time
        );
    }

    /// Count the event and hand it to stream listeners
    fn announce(&self, event: &T) -> NotificationResult<()> {
        if self.is_shutting_down() {
            return Err(NotificationError::SystemShutdown);
        }
        // No receivers is not an error
        let _ = self.sender.send(event.clone());
        self.global_stats.lock().events_published += 1;
        Ok(())
    }

    /// Publish an event and wait until every interested subscriber has
    /// handled it
    pub async fn publish(&self, event: T) -> NotificationResult<()> {
        self.announce(&event)?;
        Self::deliver_all(&self.subscribers, &self.global_stats, self.default_timeout, &event).await;
        Ok(())
    }

    /// Publish an event without waiting for subscribers. Stream listeners get
    /// it immediately; subscriber delivery happens on a background task, in
    /// posting order. Must be called from within a Tokio runtime.
    pub fn post(&self, event: T) -> NotificationResult<()> {
        if self.is_shutting_down() {
            return Err(NotificationError::SystemShutdown);
        }
        let queue = self.delivery_queue()?;
        self.announce(&event)?;
        queue
            .send(QueuedDelivery::Event(event))
            .map_err(|_| NotificationError::generic("event delivery worker stopped"))
    }

    /// Wait until every event posted so far has been delivered
    pub async fn flush(&self) {
        let queue = self.queue.lock().clone();
        if let Some(queue) = queue {
            let (done, delivered) = oneshot::channel();
            if queue.send(QueuedDelivery::Flush(done)).is_ok() {
                let _ = delivered.await;
            }
        }
    }

    /// Sender of the delivery queue, starting its worker on first use
    fn delivery_queue(&self) -> NotificationResult<mpsc::UnboundedSender<QueuedDelivery<T>>> {
        let mut queue = self.queue.lock();
        if let Some(sender) = queue.as_ref().filter(|sender| !sender.is_closed()) {
            return Ok(sender.clone());
        }

        let handle = Handle::try_current()
            .map_err(|_| NotificationError::generic("event delivery requires a Tokio runtime"))?;
        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(Self::run_delivery_worker(
            Arc::clone(&self.subscribers),
            Arc::clone(&self.global_stats),
            self.default_timeout,
            receiver,
        ));
        *queue = Some(sender.clone());
        Ok(sender)
    }

    async fn run_delivery_worker(
        subscribers: Arc<RwLock<HashMap<String, Arc<SubscriberInfo<T>>>>>,
        global_stats: Arc<Mutex<DeliveryStats>>,
        timeout_duration: Duration,
        mut receiver: mpsc::UnboundedReceiver<QueuedDelivery<T>>,
    ) {
        while let Some(job) = receiver.recv().await {
            match job {
                QueuedDelivery::Event(event) => {
                    Self::deliver_all(&subscribers, &global_stats, timeout_duration, &event).await;
                }
                QueuedDelivery::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Event delivery worker stopped");
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.read().await.contains_key(subscriber_id)
    }

    /// List all subscriber IDs
    pub async fn list_subscribers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.subscribers.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get delivery statistics
    pub fn get_stats(&self) -> DeliveryStats {
        self.global_stats.lock().clone()
    }

    /// Get subscriber-specific statistics
    pub async fn get_subscriber_stats(&self, subscriber_id: &str) -> Option<SubscriberStats> {
        let subscribers = self.subscribers.read().await;
        subscribers.get(subscriber_id).map(|info| info.stats.lock().clone())
    }

    /// Stop delivering events and drop all subscribers
    pub async fn shutdown(&self) -> NotificationResult<()> {
        debug!("Shutting down notification manager");
        self.shutdown.store(true, Ordering::SeqCst);
        // Events posted before shutdown still reach their subscribers
        self.flush().await;

        let mut subscribers = self.subscribers.write().await;
        let subscriber_count = subscribers.len();
        subscribers.clear();

        debug!("Notification manager shutdown complete ({} subscribers removed)", subscriber_count);
        Ok(())
    }
}

impl<T> Default for AsyncNotificationManager<T>
where
    T: NotificationEvent
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for AsyncNotificationManager<T>
where
    T: NotificationEvent
{
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            global_stats: Arc::clone(&self.global_stats),
            sender: self.sender.clone(),
            default_timeout: self.default_timeout,
            shutdown: Arc::clone(&self.shutdown),
            queue: Arc::clone(&self.queue),
        }
    }
}
