//! # Job Store
//!
//! Persistence seam for jobs and items. The orchestrator receives a
//! `JobStore` at construction, which keeps the engine free of global state
//! and lets the test suite run the full orchestration path against the
//! in-memory implementation in [`crate::test_helpers`].
//!
//! Semantics every implementation must honor:
//!
//! - `create_job` is all-or-nothing: one job row plus one item row per
//!   target, or nothing.
//! - `update_item_result` writes an item's terminal state at most once and
//!   reports whether this call performed the write.
//! - `increment_counters` is atomic under concurrent callers and returns
//!   the post-increment snapshot; it is never a read-modify-write.
//! - `finalize_job` transitions `processing -> terminal` exactly once.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{BulkActionItem, BulkActionJob, JobCounters, NewBulkActionJob};
use crate::orchestration::types::ExecutorResult;
use crate::state_machine::JobState;

/// Errors raised by job store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Item {0} not found")]
    ItemNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Persistence operations for jobs and their items
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert one job row and `candidate_ids.len()` item rows atomically
    async fn create_job(
        &self,
        new_job: &NewBulkActionJob,
    ) -> Result<(BulkActionJob, Vec<BulkActionItem>), StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<BulkActionJob, StoreError>;

    /// Guarded `pending -> processing` transition; false when already past
    /// pending
    async fn mark_processing(&self, job_id: Uuid) -> Result<bool, StoreError>;

    /// All items for a job in submission order
    async fn list_items(&self, job_id: Uuid) -> Result<Vec<BulkActionItem>, StoreError>;

    /// Write an item's terminal state once; false when the item was already
    /// terminal (callers must not increment counters in that case)
    async fn update_item_result(
        &self,
        item_id: Uuid,
        outcome: &ExecutorResult,
    ) -> Result<bool, StoreError>;

    /// Atomic increment of `processed_count` and the success/failed counter;
    /// returns the post-increment snapshot
    async fn increment_counters(
        &self,
        job_id: Uuid,
        success: bool,
    ) -> Result<JobCounters, StoreError>;

    /// Guarded terminal write, exactly once; false when already terminal
    async fn finalize_job(&self, job_id: Uuid, final_state: JobState) -> Result<bool, StoreError>;

    /// Append one message to the job's error log
    async fn append_error(&self, job_id: Uuid, message: &str) -> Result<(), StoreError>;

    /// Most recently processed items first, capped at `limit`
    async fn recent_items(
        &self,
        job_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BulkActionItem>, StoreError>;
}

/// PostgreSQL-backed job store
pub struct PgJobStore {
    pool: sqlx::PgPool,
}

impl PgJobStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create_job(
        &self,
        new_job: &NewBulkActionJob,
    ) -> Result<(BulkActionJob, Vec<BulkActionItem>), StoreError> {
        Ok(BulkActionJob::create_with_items(&self.pool, new_job).await?)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<BulkActionJob, StoreError> {
        BulkActionJob::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(StoreError::JobNotFound(job_id))
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<bool, StoreError> {
        Ok(BulkActionJob::mark_processing(&self.pool, job_id).await?)
    }

    async fn list_items(&self, job_id: Uuid) -> Result<Vec<BulkActionItem>, StoreError> {
        Ok(BulkActionItem::list_for_job(&self.pool, job_id).await?)
    }

    async fn update_item_result(
        &self,
        item_id: Uuid,
        outcome: &ExecutorResult,
    ) -> Result<bool, StoreError> {
        let wrote = BulkActionItem::mark_terminal(&self.pool, item_id, outcome).await?;
        if wrote {
            return Ok(true);
        }
        // Distinguish "already terminal" (a valid no-op) from a dangling id
        match BulkActionItem::find_by_id(&self.pool, item_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::ItemNotFound(item_id)),
        }
    }

    async fn increment_counters(
        &self,
        job_id: Uuid,
        success: bool,
    ) -> Result<JobCounters, StoreError> {
        BulkActionJob::increment_counters(&self.pool, job_id, success)
            .await?
            .ok_or(StoreError::JobNotFound(job_id))
    }

    async fn finalize_job(&self, job_id: Uuid, final_state: JobState) -> Result<bool, StoreError> {
        Ok(BulkActionJob::finalize(&self.pool, job_id, final_state).await?)
    }

    async fn append_error(&self, job_id: Uuid, message: &str) -> Result<(), StoreError> {
        Ok(BulkActionJob::append_error(&self.pool, job_id, message).await?)
    }

    async fn recent_items(
        &self,
        job_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BulkActionItem>, StoreError> {
        Ok(BulkActionItem::recent_processed(&self.pool, job_id, limit).await?)
    }
}
