//! Data layer for the bulk action engine.
//!
//! Persistence methods follow the associated-function-over-`PgPool` pattern;
//! all queries are runtime-checked so the crate builds without a live
//! database.

pub mod core;

pub use self::core::bulk_action_item::BulkActionItem;
pub use self::core::bulk_action_job::{BulkActionJob, JobCounters, NewBulkActionJob};
pub use self::core::candidate::Candidate;
pub use self::core::message_template::{MessageTemplate, NewMessageTemplate};
