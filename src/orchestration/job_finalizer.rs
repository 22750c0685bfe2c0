//! # Job Finalizer
//!
//! Exactly-once terminal writes for jobs, with lifecycle events.
//!
//! `complete` is called by whichever item's counter increment observed
//! `processed_count == total_count`; the guarded store write makes the
//! terminal transition idempotent under races. `fail` is reserved for
//! top-level batch faults and records the reason in the job's error log;
//! individual item failures never come through here.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::events::{lifecycle, EventPublisher};
use crate::models::JobCounters;
use crate::orchestration::store::{JobStore, StoreError};
use crate::state_machine::JobState;

/// Writes terminal job state exactly once
#[derive(Clone)]
pub struct JobFinalizer {
    store: Arc<dyn JobStore>,
    events: EventPublisher,
}

impl JobFinalizer {
    pub fn new(store: Arc<dyn JobStore>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Mark a fully processed job completed. Safe to call from the racing
    /// last writers; only the first call performs the write.
    pub async fn complete(
        &self,
        job_id: Uuid,
        counters: &JobCounters,
    ) -> Result<bool, StoreError> {
        let finalized = self.store.finalize_job(job_id, JobState::Completed).await?;
        if finalized {
            let _ = self.events.publish(
                lifecycle::JOB_COMPLETED,
                json!({
                    "job_id": job_id,
                    "total_count": counters.total_count,
                    "success_count": counters.success_count,
                    "failed_count": counters.failed_count,
                }),
            );
            info!(
                job_id = %job_id,
                success_count = counters.success_count,
                failed_count = counters.failed_count,
                "Job completed"
            );
        }
        Ok(finalized)
    }

    /// Mark a job failed after a top-level batch fault, recording the
    /// reason in the error log
    pub async fn fail(&self, job_id: Uuid, reason: &str) -> Result<bool, StoreError> {
        if let Err(e) = self.store.append_error(job_id, reason).await {
            // Still attempt the terminal write; an unrecorded reason is
            // better than a job stuck in processing
            error!(job_id = %job_id, error = %e, "Failed to append to job error log");
        }

        let finalized = self.store.finalize_job(job_id, JobState::Failed).await?;
        if finalized {
            let _ = self.events.publish(
                lifecycle::JOB_FAILED,
                json!({
                    "job_id": job_id,
                    "reason": reason,
                }),
            );
            error!(job_id = %job_id, reason = reason, "Job failed");
        }
        Ok(finalized)
    }
}
