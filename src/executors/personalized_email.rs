//! Personalized email executor.
//!
//! Produces an outreach email for each candidate through the two-tier
//! generation service: generative model first, deterministic template
//! substitution when the model is unavailable. The fallback tier always
//! succeeds, so a generation outage yields degraded successes, never item
//! failures.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::executors::{ActionExecutor, ExecutionContext, ExecutorFault, ParameterError};
use crate::orchestration::types::{ActionType, ExecutorResult};
use crate::services::candidates::{CandidateStore, CandidateStoreError};
use crate::services::generation::MessageGenerationService;

const DEFAULT_SUBJECT: &str = "An opportunity worth a look";

/// Generates a personalized outreach email per candidate
pub struct PersonalizedEmailExecutor {
    candidates: Arc<dyn CandidateStore>,
    generation: Arc<MessageGenerationService>,
}

impl PersonalizedEmailExecutor {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        generation: Arc<MessageGenerationService>,
    ) -> Self {
        Self {
            candidates,
            generation,
        }
    }
}

#[async_trait]
impl ActionExecutor for PersonalizedEmailExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::PersonalizedEmail
    }

    fn validate_parameters(&self, parameters: &Value) -> Result<(), ParameterError> {
        for key in ["subject", "base_template", "template_name"] {
            if let Some(value) = parameters.get(key) {
                if !value.is_string() {
                    return Err(ParameterError(format!("'{key}' must be a string")));
                }
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        let candidate = match self.candidates.get(context.item.candidate_id).await {
            Ok(candidate) => candidate,
            Err(CandidateStoreError::NotFound(id)) => {
                return Ok(ExecutorResult::failure(format!("Candidate {id} not found")))
            }
            Err(CandidateStoreError::Database(e)) => {
                return Err(ExecutorFault::CandidateStore(e))
            }
        };

        let message = self
            .generation
            .generate(&candidate, context.parameters)
            .await;

        let subject = context
            .parameters
            .get("subject")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SUBJECT);

        debug!(
            candidate_id = %candidate.candidate_id,
            source = %message.source,
            "Personalized email produced"
        );

        Ok(ExecutorResult::success(json!({
            "subject": subject,
            "body": message.body,
            "source": message.source,
            "recipient": candidate.email,
        })))
    }
}
