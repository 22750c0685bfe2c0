//! Core entities owned by the orchestration engine.

pub mod bulk_action_item;
pub mod bulk_action_job;
pub mod candidate;
pub mod message_template;
