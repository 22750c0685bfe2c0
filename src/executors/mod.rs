//! # Action Executors
//!
//! Pluggable per-item handlers. An executor implements one action type's
//! effect on a single candidate: it receives the item and the job's
//! parameters and must return an [`ExecutorResult`].
//!
//! Contract: expected business failures (candidate deleted, missing
//! parameter) are returned as `ExecutorResult::failure`, never as `Err`.
//! The `Err` channel is reserved for truly unexpected faults (lost database
//! connection); the job processor catches those at the per-item boundary
//! and records them as that item's failure, so a fault can never abort the
//! batch.

pub mod add_tag;
pub mod move_stage;
pub mod personalized_email;

pub use add_tag::AddTagExecutor;
pub use move_stage::MoveStageExecutor;
pub use personalized_email::PersonalizedEmailExecutor;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::BulkActionItem;
use crate::orchestration::types::{ActionType, ExecutorResult};

/// Everything an executor sees for one item
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub item: &'a BulkActionItem,
    /// The owning job's opaque parameters
    pub parameters: &'a Value,
}

/// Unexpected fault during execution; converted into an item failure at the
/// processor's per-item boundary
#[derive(Debug, thiserror::Error)]
pub enum ExecutorFault {
    #[error("Candidate store fault: {0}")]
    CandidateStore(String),

    #[error("Unexpected executor fault: {0}")]
    Unexpected(String),
}

/// Invalid job parameters, rejected at acceptance time before any row exists
#[derive(Debug, thiserror::Error)]
#[error("Invalid parameters: {0}")]
pub struct ParameterError(pub String);

/// One action type's per-item effect
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// The action type this executor handles
    fn action_type(&self) -> ActionType;

    /// Validate job parameters at acceptance time; the default accepts
    /// anything
    fn validate_parameters(&self, _parameters: &Value) -> Result<(), ParameterError> {
        Ok(())
    }

    /// Process one item
    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault>;
}

/// Shared helper: require a non-empty string parameter
pub(crate) fn require_string_parameter<'a>(
    parameters: &'a Value,
    key: &str,
) -> Result<&'a str, ParameterError> {
    match parameters.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ParameterError(format!("'{key}' must not be empty"))),
        None => Err(ParameterError(format!("'{key}' is required"))),
    }
}
