//! # Job and Item State Machines
//!
//! State definitions for bulk action jobs and their per-candidate items.
//!
//! Job status transitions are strictly monotonic:
//!
//! ```text
//! pending -> processing -> { completed | failed }
//! ```
//!
//! `completed` means "finished running" regardless of the per-item
//! success/failure mix; `failed` is reserved for top-level batch faults that
//! prevent the batch from running at all. Items transition from `pending` to
//! exactly one terminal state and are never written again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a bulk action job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted and persisted, not yet picked up by a worker
    Pending,
    /// Items are being dispatched and executed
    Processing,
    /// Every item reached a terminal state
    Completed,
    /// A top-level fault prevented the batch from running
    Failed,
}

impl JobState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if a transition to `next` is allowed; transitions are monotonic
    /// and never move backward
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, JobState::Processing)
                | (Self::Processing, JobState::Completed)
                | (Self::Processing, JobState::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Lifecycle state of a single bulk action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Created alongside its job, not yet executed
    Pending,
    /// Executor finished with a success result
    Completed,
    /// Executor finished with a failure result, or execution faulted
    Failed,
}

impl ItemState {
    /// Check if this is a terminal state (the item will never be written again)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Terminal state for an executor result success flag
    pub fn terminal_for(success: bool) -> Self {
        if success {
            Self::Completed
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid item state: {s}")),
        }
    }
}

impl Default for ItemState {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_transitions_are_monotonic() {
        assert!(JobState::Pending.can_transition_to(JobState::Processing));
        assert!(JobState::Processing.can_transition_to(JobState::Completed));
        assert!(JobState::Processing.can_transition_to(JobState::Failed));

        // No backward or skipping transitions
        assert!(!JobState::Processing.can_transition_to(JobState::Pending));
        assert!(!JobState::Pending.can_transition_to(JobState::Completed));
        assert!(!JobState::Completed.can_transition_to(JobState::Processing));
        assert!(!JobState::Failed.can_transition_to(JobState::Pending));
    }

    #[test]
    fn terminal_states_allow_no_transitions() {
        for next in [
            JobState::Pending,
            JobState::Processing,
            JobState::Completed,
            JobState::Failed,
        ] {
            assert!(!JobState::Completed.can_transition_to(next));
            assert!(!JobState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn states_round_trip_through_strings() {
        for state in [
            JobState::Pending,
            JobState::Processing,
            JobState::Completed,
            JobState::Failed,
        ] {
            assert_eq!(state.to_string().parse::<JobState>().unwrap(), state);
        }
        for state in [ItemState::Pending, ItemState::Completed, ItemState::Failed] {
            assert_eq!(state.to_string().parse::<ItemState>().unwrap(), state);
        }
    }

    #[test]
    fn item_terminal_for_maps_success_flag() {
        assert_eq!(ItemState::terminal_for(true), ItemState::Completed);
        assert_eq!(ItemState::terminal_for(false), ItemState::Failed);
        assert!(ItemState::terminal_for(true).is_terminal());
        assert!(!ItemState::Pending.is_terminal());
    }
}
