//! # Property-Based Tests
//!
//! The counter invariant under arbitrary success/failure interleavings:
//! `processed_count = success_count + failed_count <= total_count` at every
//! observed instant, with equality against `total_count` once terminal, and
//! no double counting under repeated terminal writes.

use futures::executor::block_on;
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

use recruitops_core::models::NewBulkActionJob;
use recruitops_core::orchestration::types::ActionType;
use recruitops_core::orchestration::{ExecutorResult, JobStore};
use recruitops_core::state_machine::JobState;
use recruitops_core::test_helpers::InMemoryJobStore;

fn outcome(success: bool) -> ExecutorResult {
    if success {
        ExecutorResult::success(json!({"ok": true}))
    } else {
        ExecutorResult::failure("expected business failure")
    }
}

fn new_job(count: usize) -> NewBulkActionJob {
    NewBulkActionJob {
        action_type: ActionType::Tag,
        candidate_ids: (0..count).map(|_| Uuid::new_v4()).collect(),
        parameters: json!({"tag": "prop"}),
        created_by: "proptest".to_string(),
    }
}

proptest! {
    /// The invariant holds after every single item settlement, for any
    /// interleaving of successes and failures
    #[test]
    fn counters_stay_consistent_at_every_instant(outcomes in prop::collection::vec(any::<bool>(), 1..40)) {
        let store = InMemoryJobStore::new();
        let (job, items) = block_on(store.create_job(&new_job(outcomes.len()))).unwrap();
        block_on(store.mark_processing(job.job_id)).unwrap();

        let expected_successes = outcomes.iter().filter(|s| **s).count() as i32;
        for (item, success) in items.iter().zip(outcomes.iter().copied()) {
            let wrote = block_on(store.update_item_result(item.item_id, &outcome(success))).unwrap();
            prop_assert!(wrote, "first terminal write must land");

            let counters = block_on(store.increment_counters(job.job_id, success)).unwrap();
            prop_assert!(counters.is_consistent());
            prop_assert!(counters.processed_count <= counters.total_count);
        }

        let counters = block_on(store.get_job(job.job_id)).unwrap().counters();
        prop_assert!(counters.is_complete());
        prop_assert_eq!(counters.processed_count, counters.total_count);
        prop_assert_eq!(counters.success_count, expected_successes);
        prop_assert_eq!(counters.failed_count, outcomes.len() as i32 - expected_successes);
    }

    /// Re-delivering every settlement leaves the counters untouched: the
    /// guarded terminal write reports the duplicate and the caller must not
    /// increment again
    #[test]
    fn repeated_terminal_writes_never_double_count(outcomes in prop::collection::vec(any::<bool>(), 1..30)) {
        let store = InMemoryJobStore::new();
        let (job, items) = block_on(store.create_job(&new_job(outcomes.len()))).unwrap();
        block_on(store.mark_processing(job.job_id)).unwrap();

        for (item, success) in items.iter().zip(outcomes.iter().copied()) {
            let wrote = block_on(store.update_item_result(item.item_id, &outcome(success))).unwrap();
            prop_assert!(wrote);
            block_on(store.increment_counters(job.job_id, success)).unwrap();
        }

        // Second pass: every write is a no-op, so no increment happens
        for (item, success) in items.iter().zip(outcomes.iter().copied()) {
            let wrote = block_on(store.update_item_result(item.item_id, &outcome(success))).unwrap();
            prop_assert!(!wrote, "already-terminal item must be a no-op");
        }

        let counters = block_on(store.get_job(job.job_id)).unwrap().counters();
        prop_assert_eq!(counters.processed_count, outcomes.len() as i32);
        prop_assert!(counters.is_consistent());
    }

    /// Finalization is exactly-once no matter how many racing callers reach
    /// the completion observation
    #[test]
    fn finalize_is_exactly_once(outcomes in prop::collection::vec(any::<bool>(), 1..20)) {
        let store = InMemoryJobStore::new();
        let (job, items) = block_on(store.create_job(&new_job(outcomes.len()))).unwrap();
        block_on(store.mark_processing(job.job_id)).unwrap();

        for (item, success) in items.iter().zip(outcomes.iter().copied()) {
            block_on(store.update_item_result(item.item_id, &outcome(success))).unwrap();
            block_on(store.increment_counters(job.job_id, success)).unwrap();
        }

        let first = block_on(store.finalize_job(job.job_id, JobState::Completed)).unwrap();
        let second = block_on(store.finalize_job(job.job_id, JobState::Completed)).unwrap();
        prop_assert!(first, "first finalize performs the write");
        prop_assert!(!second, "second finalize is a no-op");

        let job = block_on(store.get_job(job.job_id)).unwrap();
        prop_assert_eq!(job.state(), JobState::Completed);
        prop_assert!(job.completed_at.is_some());
    }
}
