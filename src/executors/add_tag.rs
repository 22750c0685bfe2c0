//! Tag executor: adds a tag to each target candidate.
//!
//! Idempotent: adding a tag that is already present is a success no-op, so
//! re-running a job (queue re-delivery, overlapping campaigns) never
//! duplicates tags.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::executors::{
    require_string_parameter, ActionExecutor, ExecutionContext, ExecutorFault, ParameterError,
};
use crate::orchestration::types::{ActionType, ExecutorResult};
use crate::services::candidates::{CandidateStore, CandidateStoreError};

/// Adds `parameters.tag` to each candidate's tag set
pub struct AddTagExecutor {
    candidates: Arc<dyn CandidateStore>,
}

impl AddTagExecutor {
    pub fn new(candidates: Arc<dyn CandidateStore>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl ActionExecutor for AddTagExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::Tag
    }

    fn validate_parameters(&self, parameters: &Value) -> Result<(), ParameterError> {
        require_string_parameter(parameters, "tag").map(|_| ())
    }

    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        let tag = match require_string_parameter(context.parameters, "tag") {
            Ok(tag) => tag,
            // Parameters are validated at acceptance; a missing tag here is
            // a business failure for this item, not a batch fault
            Err(e) => return Ok(ExecutorResult::failure(e.to_string())),
        };

        match self
            .candidates
            .add_tag(context.item.candidate_id, tag)
            .await
        {
            Ok(added) => {
                debug!(
                    candidate_id = %context.item.candidate_id,
                    tag = tag,
                    added = added,
                    "Tag executor finished"
                );
                Ok(ExecutorResult::success(json!({
                    "tag": tag,
                    "added": added,
                })))
            }
            Err(CandidateStoreError::NotFound(id)) => {
                Ok(ExecutorResult::failure(format!("Candidate {id} not found")))
            }
            Err(CandidateStoreError::Database(e)) => Err(ExecutorFault::CandidateStore(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_tag_parameter() {
        // The store is unused by validate_parameters
        struct NoopStore;
        #[async_trait]
        impl CandidateStore for NoopStore {
            async fn get(
                &self,
                id: uuid::Uuid,
            ) -> Result<crate::models::Candidate, CandidateStoreError> {
                Err(CandidateStoreError::NotFound(id))
            }
            async fn add_tag(
                &self,
                id: uuid::Uuid,
                _tag: &str,
            ) -> Result<bool, CandidateStoreError> {
                Err(CandidateStoreError::NotFound(id))
            }
            async fn set_stage(
                &self,
                id: uuid::Uuid,
                _stage: &str,
            ) -> Result<(), CandidateStoreError> {
                Err(CandidateStoreError::NotFound(id))
            }
        }

        let executor = AddTagExecutor::new(Arc::new(NoopStore));
        assert!(executor.validate_parameters(&json!({"tag": "hot"})).is_ok());
        assert!(executor.validate_parameters(&json!({})).is_err());
        assert!(executor.validate_parameters(&json!({"tag": "  "})).is_err());
        assert!(executor.validate_parameters(&json!({"tag": 7})).is_err());
    }
}
