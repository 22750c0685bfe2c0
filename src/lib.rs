#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # RecruitOps Core Rust
//!
//! High-performance Rust core for bulk recruiting-action orchestration.
//!
//! ## Overview
//!
//! RecruitOps Core complements the recruiting platform's web tier: the
//! platform owns HTTP routing, the candidate/job relational schema, and all
//! frontend rendering, while this crate owns the bulk action job
//! orchestration engine: durable job acceptance, dual-mode dispatch
//! (distributed queue with mandatory in-process fallback), bounded-
//! concurrency item execution, and race-safe finalization.
//!
//! ## Architecture
//!
//! A bulk action request is validated and persisted as one job row plus one
//! item row per target candidate, in a single transaction. The orchestrator
//! then hands the job to the distributed queue when it is available, or runs
//! it in-process when it is not. The queue exists purely for scale, never
//! for correctness, and every accepted job reaches a terminal state
//! regardless of broker health. Items execute under a bounded concurrency
//! limiter; each item's terminal write lands before the job's counters move,
//! and the counter increment that observes completion finalizes the job.
//!
//! ## Module Organization
//!
//! - [`models`] - Job, item, candidate, and template data layer
//! - [`database`] - Connection pooling and schema migrations
//! - [`state_machine`] - Job and item state definitions and guards
//! - [`config`] - Typed configuration with file and environment layering
//! - [`error`] - Crate-level error handling
//! - [`events`] - Lifecycle event publishing
//! - [`execution`] - Concurrency primitives
//! - [`executors`] - Per-action-type item handlers
//! - [`messaging`] - pgmq-backed queue client
//! - [`orchestration`] - Job acceptance, dispatch, processing, finalization
//! - [`registry`] - Action executor registration and discovery
//! - [`services`] - External collaborators: candidates, templates, generation
//! - [`test_helpers`] - In-memory trait implementations for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recruitops_core::execution::ConcurrencyLimiter;
//! use recruitops_core::events::EventPublisher;
//! use recruitops_core::orchestration::{BulkActionOrchestrator, BulkActionRequest};
//! use recruitops_core::registry::ExecutorRegistry;
//! use recruitops_core::test_helpers::InMemoryJobStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryJobStore::new());
//! let registry = Arc::new(ExecutorRegistry::new());
//! // register executors, then:
//! let orchestrator = BulkActionOrchestrator::new(
//!     store,
//!     registry,
//!     ConcurrencyLimiter::new(5),
//!     None, // no queue adapter; every job runs in-process
//!     EventPublisher::default(),
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod execution;
pub mod executors;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod services;
pub mod state_machine;
pub mod test_helpers;

pub use config::{ConfigManager, RecruitOpsConfig};
pub use error::{RecruitOpsError, Result};
pub use events::EventPublisher;
pub use execution::ConcurrencyLimiter;
pub use models::{BulkActionItem, BulkActionJob, Candidate, JobCounters, MessageTemplate};
pub use orchestration::{
    ActionType, BulkActionAccepted, BulkActionOrchestrator, BulkActionRequest, ExecutorResult,
    JobProcessor, JobStore, StatusReporter,
};
pub use registry::ExecutorRegistry;
pub use state_machine::{ItemState, JobState};
