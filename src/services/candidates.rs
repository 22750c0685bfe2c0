//! # Candidate Access
//!
//! Interface boundary to the platform's candidate records. Executors only
//! ever touch candidates through this trait: a read of the projection plus
//! the two single-row writes the action executors need. A failure here can
//! fail an individual item but can never corrupt job/item invariants.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::Candidate;

/// Errors raised by candidate store implementations.
///
/// `NotFound` is an expected business failure (the candidate was deleted
/// between acceptance and execution); `Database` is an unexpected fault.
#[derive(Debug, thiserror::Error)]
pub enum CandidateStoreError {
    #[error("Candidate {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for CandidateStoreError {
    fn from(err: sqlx::Error) -> Self {
        CandidateStoreError::Database(err.to_string())
    }
}

/// Candidate operations consumed by action executors
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn get(&self, candidate_id: Uuid) -> Result<Candidate, CandidateStoreError>;

    /// Idempotent tag addition: true when the tag was added, false when it
    /// was already present (a no-op, not an error)
    async fn add_tag(&self, candidate_id: Uuid, tag: &str) -> Result<bool, CandidateStoreError>;

    /// Overwrite the candidate's pipeline stage
    async fn set_stage(&self, candidate_id: Uuid, stage: &str)
        -> Result<(), CandidateStoreError>;
}

/// PostgreSQL-backed candidate store
pub struct PgCandidateStore {
    pool: sqlx::PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn get(&self, candidate_id: Uuid) -> Result<Candidate, CandidateStoreError> {
        Candidate::find_by_id(&self.pool, candidate_id)
            .await?
            .ok_or(CandidateStoreError::NotFound(candidate_id))
    }

    async fn add_tag(&self, candidate_id: Uuid, tag: &str) -> Result<bool, CandidateStoreError> {
        Candidate::add_tag(&self.pool, candidate_id, tag)
            .await?
            .ok_or(CandidateStoreError::NotFound(candidate_id))
    }

    async fn set_stage(
        &self,
        candidate_id: Uuid,
        stage: &str,
    ) -> Result<(), CandidateStoreError> {
        let updated = Candidate::set_stage(&self.pool, candidate_id, stage).await?;
        if updated {
            Ok(())
        } else {
            Err(CandidateStoreError::NotFound(candidate_id))
        }
    }
}
