//! # BulkActionJob Model
//!
//! One bulk-action request spanning many target candidates.
//!
//! A job row carries the aggregate counters for its items. The counter
//! invariant `processed_count = success_count + failed_count <= total_count`
//! holds at every observed instant and reaches equality with `total_count`
//! exactly when the job becomes terminal; it is also enforced as a CHECK
//! constraint in the schema.
//!
//! Counter updates are single atomic `UPDATE ... RETURNING` statements.
//! Many items complete concurrently and race on one job row, so the
//! increment is never expressed as an application-level read-modify-write.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::core::bulk_action_item::BulkActionItem;
use crate::orchestration::types::ActionType;
use crate::state_machine::JobState;

/// Bulk action job row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BulkActionJob {
    pub job_id: Uuid,
    pub action_type: String,
    pub status: String,
    pub total_count: i32,
    pub processed_count: i32,
    pub success_count: i32,
    pub failed_count: i32,
    pub parameters: Value,
    pub created_by: String,
    /// JSON array of strings; top-level batch faults append here
    pub error_log: Value,
    pub created_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

/// Request to create a job together with its items
#[derive(Debug, Clone)]
pub struct NewBulkActionJob {
    pub action_type: ActionType,
    pub candidate_ids: Vec<Uuid>,
    pub parameters: Value,
    pub created_by: String,
}

/// Aggregate counter snapshot returned by the atomic increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobCounters {
    pub total_count: i32,
    pub processed_count: i32,
    pub success_count: i32,
    pub failed_count: i32,
}

impl JobCounters {
    /// True once every item has reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.processed_count >= self.total_count
    }

    /// The invariant that must hold at every observed instant
    pub fn is_consistent(&self) -> bool {
        self.processed_count == self.success_count + self.failed_count
            && self.processed_count <= self.total_count
    }
}

impl BulkActionJob {
    /// Parsed job state; rows are only ever written with valid states
    pub fn state(&self) -> JobState {
        self.status.parse().unwrap_or_default()
    }

    /// Current counter snapshot from this row
    pub fn counters(&self) -> JobCounters {
        JobCounters {
            total_count: self.total_count,
            processed_count: self.processed_count,
            success_count: self.success_count,
            failed_count: self.failed_count,
        }
    }

    /// Error log entries as strings
    pub fn errors(&self) -> Vec<String> {
        self.error_log
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Create one job row plus one item row per candidate in a single
    /// transaction. Any failure rolls the whole operation back; a job is
    /// never left without its items or vice versa.
    pub async fn create_with_items(
        pool: &PgPool,
        new_job: &NewBulkActionJob,
    ) -> Result<(BulkActionJob, Vec<BulkActionItem>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let action_type = new_job.action_type.to_string();
        let job: BulkActionJob = sqlx::query_as(
            r#"
            INSERT INTO bulk_action_jobs
                (job_id, action_type, status, total_count, parameters, created_by, error_log,
                 created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $4, $5, '[]'::jsonb, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&action_type)
        .bind(new_job.candidate_ids.len() as i32)
        .bind(&new_job.parameters)
        .bind(&new_job.created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new_job.candidate_ids.len());
        for candidate_id in &new_job.candidate_ids {
            let item: BulkActionItem = sqlx::query_as(
                r#"
                INSERT INTO bulk_action_items
                    (item_id, job_id, candidate_id, action_type, status, created_at)
                VALUES ($1, $2, $3, $4, 'pending', NOW())
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(job.job_id)
            .bind(candidate_id)
            .bind(&action_type)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok((job, items))
    }

    pub async fn find_by_id(pool: &PgPool, job_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bulk_action_jobs WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Guarded `pending -> processing` transition; sets `started_at`.
    /// Returns false when the job is already past pending, which makes
    /// re-delivered queue messages harmless.
    pub async fn mark_processing(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE bulk_action_jobs
            SET status = 'processing', started_at = NOW(), updated_at = NOW()
            WHERE job_id = $1 AND status = 'pending'
            "#,
        )
        .bind(job_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomic counter increment for one completed item. The returned
    /// snapshot is what drives finalization: the caller whose increment
    /// reaches `total_count` finalizes the job, with no re-query.
    pub async fn increment_counters(
        pool: &PgPool,
        job_id: Uuid,
        success: bool,
    ) -> Result<Option<JobCounters>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bulk_action_jobs
            SET processed_count = processed_count + 1,
                success_count = success_count + CASE WHEN $2 THEN 1 ELSE 0 END,
                failed_count = failed_count + CASE WHEN $2 THEN 0 ELSE 1 END,
                updated_at = NOW()
            WHERE job_id = $1
            RETURNING total_count, processed_count, success_count, failed_count
            "#,
        )
        .bind(job_id)
        .bind(success)
        .fetch_optional(pool)
        .await
    }

    /// Guarded terminal write; sets `completed_at` exactly once.
    /// Returns false when the job is already terminal.
    pub async fn finalize(
        pool: &PgPool,
        job_id: Uuid,
        final_state: JobState,
    ) -> Result<bool, sqlx::Error> {
        debug_assert!(final_state.is_terminal());
        let result = sqlx::query(
            r#"
            UPDATE bulk_action_jobs
            SET status = $2, completed_at = NOW(), updated_at = NOW()
            WHERE job_id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(final_state.to_string())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append one message to the job's error log
    pub async fn append_error(
        pool: &PgPool,
        job_id: Uuid,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE bulk_action_jobs
            SET error_log = error_log || $2, updated_at = NOW()
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(Value::Array(vec![Value::String(message.to_string())]))
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job(status: &str, counters: (i32, i32, i32, i32)) -> BulkActionJob {
        let now = chrono::Utc::now().naive_utc();
        BulkActionJob {
            job_id: Uuid::new_v4(),
            action_type: "tag".to_string(),
            status: status.to_string(),
            total_count: counters.0,
            processed_count: counters.1,
            success_count: counters.2,
            failed_count: counters.3,
            parameters: json!({"tag": "bulk_contacted"}),
            created_by: "recruiter-7".to_string(),
            error_log: json!(["could not load items"]),
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn state_parses_from_status_column() {
        assert_eq!(sample_job("pending", (5, 0, 0, 0)).state(), JobState::Pending);
        assert_eq!(
            sample_job("processing", (5, 2, 1, 1)).state(),
            JobState::Processing
        );
        assert_eq!(
            sample_job("completed", (5, 5, 4, 1)).state(),
            JobState::Completed
        );
    }

    #[test]
    fn counters_consistency_and_completion() {
        let mid = sample_job("processing", (10, 4, 3, 1)).counters();
        assert!(mid.is_consistent());
        assert!(!mid.is_complete());

        let done = sample_job("completed", (10, 10, 8, 2)).counters();
        assert!(done.is_consistent());
        assert!(done.is_complete());

        let broken = JobCounters {
            total_count: 10,
            processed_count: 4,
            success_count: 3,
            failed_count: 2,
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn errors_reads_log_entries() {
        let job = sample_job("failed", (3, 0, 0, 0));
        assert_eq!(job.errors(), vec!["could not load items".to_string()]);
    }
}
