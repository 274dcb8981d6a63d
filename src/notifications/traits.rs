//! Subscriber Traits
//!
//! Contracts for components that observe runtime events without being part
//! of the dispatcher's call stack.

use std::collections::HashSet;
use async_trait::async_trait;
use crate::notifications::error::NotificationResult;
use crate::notifications::events::NotificationEvent;

/// Component that handles published events
#[async_trait]
pub trait Subscriber<T>: Send + Sync
where
    T: NotificationEvent
{
    /// Handle an incoming event
    async fn handle_event(&self, event: T) -> NotificationResult<()>;

    /// Get the subscriber identifier (must be unique)
    fn subscriber_id(&self) -> &str;

    /// Event types this subscriber wants
    fn event_filter(&self) -> EventFilter {
        EventFilter::AcceptAll
    }

    /// Check if this subscriber should receive the event
    fn should_receive(&self, event: &T) -> bool {
        self.event_filter().should_accept(event)
    }
}

/// Event filtering options for subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    /// Accept all events
    AcceptAll,
    /// Accept only the named event types
    EventTypes(HashSet<String>),
}

impl EventFilter {
    /// Filter accepting the given event type names
    pub fn only<I, S>(event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventFilter::EventTypes(event_types.into_iter().map(Into::into).collect())
    }

    /// Check if an event should be accepted
    pub fn should_accept<T: NotificationEvent>(&self, event: &T) -> bool {
        match self {
            EventFilter::AcceptAll => true,
            EventFilter::EventTypes(types) => types.contains(event.event_type()),
        }
    }
}

/// Statistics about notification delivery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryStats {
    /// Total events published
    pub events_published: u64,

    /// Total events delivered successfully
    pub events_delivered: u64,

    /// Total delivery failures (errors, panics, timeouts)
    pub delivery_failures: u64,

    /// Average delivery time in microseconds
    pub avg_delivery_time_us: u64,
}
