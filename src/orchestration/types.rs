//! Shared types for the bulk action orchestration engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::state_machine::JobState;

/// Typed action identifiers.
///
/// The wire format (`POST` create, job rows, queue messages) carries the
/// snake_case string form; unknown strings are rejected at acceptance time,
/// before any job row exists. Adding an action type means adding a variant
/// and registering its executor; the orchestrator itself never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Add a tag to each candidate (idempotent per candidate)
    Tag,
    /// Move each candidate to a pipeline stage
    MoveStage,
    /// Generate and record a personalized outreach email
    PersonalizedEmail,
}

impl ActionType {
    /// Every known action type; registry completeness is validated against
    /// this list at startup
    pub const ALL: [ActionType; 3] = [
        ActionType::Tag,
        ActionType::MoveStage,
        ActionType::PersonalizedEmail,
    ];
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => write!(f, "tag"),
            Self::MoveStage => write!(f, "move_stage"),
            Self::PersonalizedEmail => write!(f, "personalized_email"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tag" => Ok(Self::Tag),
            "move_stage" => Ok(Self::MoveStage),
            "personalized_email" => Ok(Self::PersonalizedEmail),
            _ => Err(format!("Unknown action type: {s}")),
        }
    }
}

/// Client request to run a bulk action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActionRequest {
    pub action_type: String,
    pub candidate_ids: Vec<Uuid>,
    #[serde(default = "default_parameters")]
    pub parameters: Value,
    pub requested_by: String,
}

fn default_parameters() -> Value {
    Value::Object(serde_json::Map::new())
}

/// The only shape an executor may return.
///
/// Expected business failures travel as `success: false` with an error
/// message; the executor's `Err` channel is reserved for truly unexpected
/// faults and is converted into an item failure at the execution boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutorResult {
    /// Successful outcome with a payload
    pub fn success(content: Value) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    /// Expected business failure
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
        }
    }
}

/// How an accepted job was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Handed to the distributed queue; a worker will pick it up
    Queued,
    /// Running in-process on the accepting node
    InProcess,
}

/// Acceptance response for a created job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActionAccepted {
    pub job_id: Uuid,
    pub status: JobState,
    pub total_count: i32,
    pub dispatch: DispatchMode,
}

/// Payload carried on the distributed queue for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobQueueMessage {
    pub job_id: Uuid,
    pub action_type: String,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl JobQueueMessage {
    pub fn new(job_id: Uuid, action_type: &str) -> Self {
        Self {
            job_id,
            action_type: action_type.to_string(),
            enqueued_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_types_round_trip_through_strings() {
        for action in ActionType::ALL {
            assert_eq!(action.to_string().parse::<ActionType>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        assert!("delete_everything".parse::<ActionType>().is_err());
        assert!("".parse::<ActionType>().is_err());
    }

    #[test]
    fn executor_result_constructors() {
        let ok = ExecutorResult::success(json!({"tag": "hot"}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = ExecutorResult::failure("candidate not found");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("candidate not found"));
        assert!(failed.content.is_none());
    }

    #[test]
    fn request_defaults_parameters_to_empty_object() {
        let request: BulkActionRequest = serde_json::from_value(json!({
            "action_type": "tag",
            "candidate_ids": [Uuid::new_v4()],
            "requested_by": "recruiter-1"
        }))
        .unwrap();
        assert!(request.parameters.is_object());
    }
}
