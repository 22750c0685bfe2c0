//! # Job Initializer
//!
//! Validation and atomic job creation.
//!
//! Validation runs before anything is written: a missing action type, an
//! empty candidate list, an unknown action type, or parameters the
//! registered executor rejects are all synchronous errors to the caller and
//! leave no trace in the store. Creation itself is a single transaction:
//! one job row plus one item row per candidate, or nothing.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::events::{lifecycle, EventPublisher};
use crate::models::{BulkActionItem, BulkActionJob, NewBulkActionJob};
use crate::orchestration::store::{JobStore, StoreError};
use crate::orchestration::types::{ActionType, BulkActionRequest};
use crate::registry::ExecutorRegistry;

/// Errors surfaced synchronously at acceptance time
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Rejected before any job row exists
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The creation transaction failed and was rolled back
    #[error("Job creation failed: {0}")]
    Creation(#[from] StoreError),
}

/// Validates requests and creates jobs with their items
pub struct JobInitializer {
    store: Arc<dyn JobStore>,
    registry: Arc<ExecutorRegistry>,
    events: EventPublisher,
}

impl JobInitializer {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<ExecutorRegistry>,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            registry,
            events,
        }
    }

    /// Validate a request and create the job atomically
    #[instrument(skip(self, request), fields(action_type = %request.action_type))]
    pub async fn create_job(
        &self,
        request: &BulkActionRequest,
    ) -> Result<(BulkActionJob, Vec<BulkActionItem>), SubmissionError> {
        let action_type = self.validate(request)?;

        let new_job = NewBulkActionJob {
            action_type,
            candidate_ids: request.candidate_ids.clone(),
            parameters: request.parameters.clone(),
            created_by: request.requested_by.clone(),
        };
        let (job, items) = self.store.create_job(&new_job).await?;

        let _ = self.events.publish(
            lifecycle::JOB_INITIALIZED,
            json!({
                "job_id": job.job_id,
                "action_type": job.action_type,
                "total_count": job.total_count,
                "created_by": job.created_by,
            }),
        );

        info!(
            job_id = %job.job_id,
            total_count = job.total_count,
            "Created bulk action job"
        );
        Ok((job, items))
    }

    /// Synchronous validation; nothing is written when this fails
    fn validate(&self, request: &BulkActionRequest) -> Result<ActionType, SubmissionError> {
        if request.action_type.trim().is_empty() {
            return Err(SubmissionError::Validation(
                "action_type is required".to_string(),
            ));
        }
        if request.candidate_ids.is_empty() {
            return Err(SubmissionError::Validation(
                "candidate_ids must not be empty".to_string(),
            ));
        }

        let action_type: ActionType = request
            .action_type
            .parse()
            .map_err(SubmissionError::Validation)?;

        let executor = self
            .registry
            .resolve(action_type)
            .map_err(|e| SubmissionError::Validation(e.to_string()))?;
        executor
            .validate_parameters(&request.parameters)
            .map_err(|e| SubmissionError::Validation(e.to_string()))?;

        Ok(action_type)
    }
}
