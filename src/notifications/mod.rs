//! Pub/Sub Notification System
//!
//! Lets collaborators (UI, chat integration, logging) observe what the plugin
//! runtime does without being coupled to the dispatcher's call stack.
//!
//! # Example Usage
//!
//! ```no_run
//! use genome_plugins::notifications::{EventBus, PluginEvent};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = EventBus::new();
//! // returns at once; subscribers are called on a background task
//! bus.post(PluginEvent::system_initialized())?;
//! bus.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod manager;
pub mod events;
pub mod error;


pub use manager::{AsyncNotificationManager, SubscriberStats};
pub use events::{NotificationEvent, PluginEvent};
pub use traits::{DeliveryStats, EventFilter, Subscriber};
pub use traits::Subscriber as EventSubscriber;
pub use error::{NotificationError, NotificationResult};

/// Event bus carrying plugin runtime events
pub type EventBus = AsyncNotificationManager<PluginEvent>;
