//! # BulkActionItem Model
//!
//! One target candidate's unit of work within a job.
//!
//! Items are created in the same transaction as their job and mutate exactly
//! once: the terminal write is guarded on `status = 'pending'`, so a repeat
//! call for an already-terminal item is a no-op rather than a second write.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::orchestration::types::ExecutorResult;
use crate::state_machine::ItemState;

/// Bulk action item row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BulkActionItem {
    pub item_id: Uuid,
    /// Owning job; an item is never shared between jobs
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    /// Denormalized copy of the job's action type
    pub action_type: String,
    pub status: String,
    /// Opaque per-executor payload
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub processed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl BulkActionItem {
    /// Parsed item state; rows are only ever written with valid states
    pub fn state(&self) -> ItemState {
        self.status.parse().unwrap_or_default()
    }

    /// All items for a job in creation (submission) order
    pub async fn list_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM bulk_action_items
            WHERE job_id = $1
            ORDER BY created_at ASC, item_id ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, item_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bulk_action_items WHERE item_id = $1")
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// Write the item's terminal state once. Returns false when the item was
    /// already terminal (idempotent under queue re-delivery); callers must
    /// not increment job counters in that case.
    pub async fn mark_terminal(
        pool: &PgPool,
        item_id: Uuid,
        outcome: &ExecutorResult,
    ) -> Result<bool, sqlx::Error> {
        let status = ItemState::terminal_for(outcome.success).to_string();
        let result = sqlx::query(
            r#"
            UPDATE bulk_action_items
            SET status = $2, result = $3, error_message = $4, processed_at = NOW()
            WHERE item_id = $1 AND status = 'pending'
            "#,
        )
        .bind(item_id)
        .bind(status)
        .bind(&outcome.content)
        .bind(&outcome.error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recently processed items first, capped for the status read path
    pub async fn recent_processed(
        pool: &PgPool,
        job_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM bulk_action_items
            WHERE job_id = $1 AND status <> 'pending'
            ORDER BY processed_at DESC NULLS LAST, item_id ASC
            LIMIT $2
            "#,
        )
        .bind(job_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_parses_from_status_column() {
        let now = chrono::Utc::now().naive_utc();
        let item = BulkActionItem {
            item_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            action_type: "move_stage".to_string(),
            status: "completed".to_string(),
            result: Some(json!({"stage": "screen"})),
            error_message: None,
            processed_at: Some(now),
            created_at: now,
        };
        assert_eq!(item.state(), ItemState::Completed);
        assert!(item.state().is_terminal());
    }
}
