//! Event system foundation: lifecycle event names and the broadcast publisher.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};

/// Lifecycle event names published by the orchestration engine.
///
/// Subscribers (audit trail, websocket notifiers in the platform tier) match
/// on these names; publishing with zero subscribers is not an error.
pub mod lifecycle {
    pub const JOB_INITIALIZED: &str = "job.initialized";
    pub const JOB_ENQUEUED: &str = "job.enqueued";
    pub const JOB_DISPATCHED_INLINE: &str = "job.dispatched_inline";
    pub const JOB_STARTED: &str = "job.started";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const JOB_FAILED: &str = "job.failed";
    pub const ITEM_COMPLETED: &str = "item.completed";
    pub const ITEM_FAILED: &str = "item.failed";
}
