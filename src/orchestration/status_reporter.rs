//! # Status Reporter
//!
//! Read path behind the status query: the job's fields plus a small window
//! of the most recently processed items. Everything after acceptance is
//! asynchronous, so this view is how callers observe progress and partial
//! failure: counts, never exceptions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{BulkActionItem, BulkActionJob};
use crate::orchestration::store::{JobStore, StoreError};
use crate::state_machine::{ItemState, JobState};

/// Errors raised by status queries
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for StatusError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(id) => StatusError::NotFound(id),
            other => StatusError::Database(other.to_string()),
        }
    }
}

/// One recently processed item in the status view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStatusView {
    pub item_id: Uuid,
    pub candidate_id: Uuid,
    pub status: ItemState,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub processed_at: Option<NaiveDateTime>,
}

impl From<BulkActionItem> for ItemStatusView {
    fn from(item: BulkActionItem) -> Self {
        Self {
            status: item.state(),
            item_id: item.item_id,
            candidate_id: item.candidate_id,
            result: item.result,
            error_message: item.error_message,
            processed_at: item.processed_at,
        }
    }
}

/// Aggregate job status plus recent items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub action_type: String,
    pub status: JobState,
    pub total_count: i32,
    pub processed_count: i32,
    pub success_count: i32,
    pub failed_count: i32,
    pub created_by: String,
    pub error_log: Vec<String>,
    pub created_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub recent_items: Vec<ItemStatusView>,
}

impl JobStatusView {
    fn build(job: BulkActionJob, recent: Vec<BulkActionItem>) -> Self {
        Self {
            status: job.state(),
            error_log: job.errors(),
            job_id: job.job_id,
            action_type: job.action_type,
            total_count: job.total_count,
            processed_count: job.processed_count,
            success_count: job.success_count,
            failed_count: job.failed_count,
            created_by: job.created_by,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            recent_items: recent.into_iter().map(ItemStatusView::from).collect(),
        }
    }
}

/// Aggregates job state for status queries
pub struct StatusReporter {
    store: Arc<dyn JobStore>,
    recent_items_limit: i64,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn JobStore>, recent_items_limit: i64) -> Self {
        Self {
            store,
            recent_items_limit: recent_items_limit.max(1),
        }
    }

    /// Fetch the status view for one job; unknown ids are NotFound
    pub async fn job_status(&self, job_id: Uuid) -> Result<JobStatusView, StatusError> {
        let job = self.store.get_job(job_id).await?;
        let recent = self
            .store
            .recent_items(job_id, self.recent_items_limit)
            .await?;
        Ok(JobStatusView::build(job, recent))
    }
}
