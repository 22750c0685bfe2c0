//! Pipeline-stage executor: overwrites each candidate's stage field.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::executors::{
    require_string_parameter, ActionExecutor, ExecutionContext, ExecutorFault, ParameterError,
};
use crate::orchestration::types::{ActionType, ExecutorResult};
use crate::services::candidates::{CandidateStore, CandidateStoreError};

/// Moves each candidate to `parameters.stage`
pub struct MoveStageExecutor {
    candidates: Arc<dyn CandidateStore>,
}

impl MoveStageExecutor {
    pub fn new(candidates: Arc<dyn CandidateStore>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl ActionExecutor for MoveStageExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::MoveStage
    }

    fn validate_parameters(&self, parameters: &Value) -> Result<(), ParameterError> {
        require_string_parameter(parameters, "stage").map(|_| ())
    }

    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        let stage = match require_string_parameter(context.parameters, "stage") {
            Ok(stage) => stage,
            Err(e) => return Ok(ExecutorResult::failure(e.to_string())),
        };

        match self
            .candidates
            .set_stage(context.item.candidate_id, stage)
            .await
        {
            Ok(()) => {
                debug!(
                    candidate_id = %context.item.candidate_id,
                    stage = stage,
                    "Stage executor finished"
                );
                Ok(ExecutorResult::success(json!({ "stage": stage })))
            }
            Err(CandidateStoreError::NotFound(id)) => {
                Ok(ExecutorResult::failure(format!("Candidate {id} not found")))
            }
            Err(CandidateStoreError::Database(e)) => Err(ExecutorFault::CandidateStore(e)),
        }
    }
}
