//! Broadcast-channel publisher for orchestration lifecycle events.
//!
//! The engine publishes a small set of named events (see
//! [`crate::events::lifecycle`]) as jobs and items move through their state
//! machines. Consumers subscribe for observability; the engine never depends
//! on a subscriber being present.

use serde_json::Value;
use tokio::sync::broadcast;

/// High-throughput publisher for job and item lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub fn publish(&self, event_name: impl Into<String>, context: Value) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // broadcast::Sender::send errors when there are no subscribers; events
        // are best-effort observability, so that case is not a failure
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::lifecycle;
    use serde_json::json;

    #[tokio::test]
    async fn publishes_to_subscriber() {
        let publisher = EventPublisher::new(16);
        let mut rx = publisher.subscribe();

        publisher
            .publish(lifecycle::JOB_STARTED, json!({"job_id": "abc"}))
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, lifecycle::JOB_STARTED);
        assert_eq!(event.context["job_id"], "abc");
    }

    #[test]
    fn publishing_without_subscribers_is_ok() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        assert!(publisher.publish(lifecycle::JOB_COMPLETED, json!({})).is_ok());
    }
}
