//! In-memory trait implementations for tests and examples.
//!
//! These honor the same semantics as the PostgreSQL implementations
//! (guarded terminal writes, atomic counter snapshots, idempotent tag
//! adds), which lets the full orchestration path run in the test suite
//! without a database.

pub mod doubles;
pub mod stores;

pub use doubles::{
    FailingGenerativeClient, FailingJobQueue, RecordingJobQueue, StaticGenerativeClient,
    UnavailableJobQueue,
};
pub use stores::{InMemoryCandidateStore, InMemoryJobStore, InMemoryTemplateStore};
