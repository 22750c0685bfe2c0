//! # Candidate Model
//!
//! Minimal projection of the platform's candidate row used by executors.
//! The full candidate schema (resume data, scoring, activity history) is
//! owned by the platform; this crate only reads the fields executors need
//! and performs two single-row writes: idempotent tag addition and pipeline
//! stage overwrite.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Candidate projection consumed by action executors
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candidate {
    pub candidate_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub pipeline_stage: Option<String>,
    /// JSON array of strings
    pub tags: Value,
}

impl Candidate {
    /// Full display name
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    /// Tags as strings
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a tag is present
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().iter().any(|t| t == tag)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        candidate_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT candidate_id, first_name, last_name, email, company, title,
                   pipeline_stage, tags
            FROM candidates
            WHERE candidate_id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(pool)
        .await
    }

    /// Idempotent tag addition in one statement. Returns `Some(true)` when
    /// the tag was added, `Some(false)` when it was already present, `None`
    /// when the candidate does not exist.
    pub async fn add_tag(
        pool: &PgPool,
        candidate_id: Uuid,
        tag: &str,
    ) -> Result<Option<bool>, sqlx::Error> {
        let added: Option<(bool,)> = sqlx::query_as(
            r#"
            WITH before AS (
                SELECT tags ? $2::text AS already_present
                FROM candidates
                WHERE candidate_id = $1
            )
            UPDATE candidates c
            SET tags = CASE
                    WHEN c.tags ? $2::text THEN c.tags
                    ELSE c.tags || to_jsonb($2::text)
                END,
                updated_at = NOW()
            FROM before
            WHERE c.candidate_id = $1
            RETURNING NOT before.already_present AS added
            "#,
        )
        .bind(candidate_id)
        .bind(tag)
        .fetch_optional(pool)
        .await?;
        Ok(added.map(|(a,)| a))
    }

    /// Overwrite the pipeline stage. Returns false when the candidate does
    /// not exist.
    pub async fn set_stage(
        pool: &PgPool,
        candidate_id: Uuid,
        stage: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE candidates
            SET pipeline_stage = $2, updated_at = NOW()
            WHERE candidate_id = $1
            "#,
        )
        .bind(candidate_id)
        .bind(stage)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
