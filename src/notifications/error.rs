//! Event Bus Errors

use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

/// Failures of subscription management and event delivery
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Subscriber '{0}' is already registered")]
    SubscriberAlreadyExists(String),

    #[error("No subscriber with id '{0}'")]
    SubscriberNotFound(String),

    /// Handler returned an error or panicked
    #[error("Delivery to '{subscriber_id}' failed: {error}")]
    DeliveryFailed { subscriber_id: String, error: String },

    #[error("Event bus has been shut down")]
    SystemShutdown,

    #[error("{operation} exceeded {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("{0}")]
    Generic(String),
}

impl NotificationError {
    pub fn subscriber_already_exists<S: Into<String>>(id: S) -> Self {
        Self::SubscriberAlreadyExists(id.into())
    }

    pub fn subscriber_not_found<S: Into<String>>(id: S) -> Self {
        Self::SubscriberNotFound(id.into())
    }

    pub fn delivery_failed<S: Into<String>, E: Into<String>>(subscriber_id: S, error: E) -> Self {
        Self::DeliveryFailed { subscriber_id: subscriber_id.into(), error: error.into() }
    }

    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// True for errors raised while handing an event to a subscriber
    pub fn is_delivery_error(&self) -> bool {
        matches!(self, Self::DeliveryFailed { .. } | Self::Timeout { .. })
    }
}
