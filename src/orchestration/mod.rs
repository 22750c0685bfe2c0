//! # Bulk Action Orchestration
//!
//! The job orchestration engine: durable job acceptance, dual-mode dispatch
//! (distributed queue with mandatory in-process fallback), bounded-
//! concurrency item execution, and race-safe finalization.
//!
//! Component map:
//!
//! - [`core::BulkActionOrchestrator`] - acceptance and dispatch decisions
//! - [`job_initializer::JobInitializer`] - validation + transactional creation
//! - [`job_enqueuer::JobQueue`] - optional distributed dispatch seam
//! - [`job_processor::JobProcessor`] - the shared per-item execution path
//! - [`job_finalizer::JobFinalizer`] - exactly-once terminal writes
//! - [`queue_worker::QueueWorker`] - distributed consumer loop
//! - [`status_reporter::StatusReporter`] - the read path
//! - [`store::JobStore`] - persistence seam

pub mod core;
pub mod job_enqueuer;
pub mod job_finalizer;
pub mod job_initializer;
pub mod job_processor;
pub mod queue_worker;
pub mod status_reporter;
pub mod store;
pub mod types;

pub use self::core::BulkActionOrchestrator;
pub use job_enqueuer::{EnqueueError, JobQueue, PgmqJobQueue};
pub use job_finalizer::JobFinalizer;
pub use job_initializer::{JobInitializer, SubmissionError};
pub use job_processor::{JobOutcome, JobProcessor, ProcessingError};
pub use queue_worker::QueueWorker;
pub use status_reporter::{ItemStatusView, JobStatusView, StatusError, StatusReporter};
pub use store::{JobStore, PgJobStore, StoreError};
pub use types::{
    ActionType, BulkActionAccepted, BulkActionRequest, DispatchMode, ExecutorResult,
    JobQueueMessage,
};
