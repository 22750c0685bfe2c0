//! # Orchestration Integration Tests
//!
//! End-to-end runs of the bulk action engine against the in-memory stores:
//! acceptance, dispatch (queued, fallback, in-process), per-item execution,
//! isolation, and finalization. These are the executable versions of the
//! engine's user-visible contract: a successfully created job always reaches
//! a terminal state, and partial failure is expressed through counts.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use recruitops_core::events::EventPublisher;
use recruitops_core::execution::ConcurrencyLimiter;
use recruitops_core::executors::{
    ActionExecutor, AddTagExecutor, ExecutionContext, ExecutorFault, MoveStageExecutor,
    PersonalizedEmailExecutor,
};
use recruitops_core::models::BulkActionJob;
use recruitops_core::orchestration::{
    ActionType, BulkActionOrchestrator, BulkActionRequest, DispatchMode, ExecutorResult,
    JobProcessor, StatusError, StatusReporter, SubmissionError,
};
use recruitops_core::registry::ExecutorRegistry;
use recruitops_core::services::generation::MessageGenerationService;
use recruitops_core::state_machine::{ItemState, JobState};
use recruitops_core::test_helpers::{
    FailingGenerativeClient, FailingJobQueue, InMemoryCandidateStore, InMemoryJobStore,
    RecordingJobQueue, StaticGenerativeClient, UnavailableJobQueue,
};

/// Registry with the three production executors over the given candidate
/// store; generation is scripted per test
fn full_registry(
    candidates: Arc<InMemoryCandidateStore>,
    generation: MessageGenerationService,
) -> Arc<ExecutorRegistry> {
    let registry = ExecutorRegistry::new();
    registry
        .register(Arc::new(AddTagExecutor::new(candidates.clone())))
        .unwrap();
    registry
        .register(Arc::new(MoveStageExecutor::new(candidates.clone())))
        .unwrap();
    registry
        .register(Arc::new(PersonalizedEmailExecutor::new(
            candidates,
            Arc::new(generation),
        )))
        .unwrap();
    registry.validate_complete().unwrap();
    Arc::new(registry)
}

fn request(action_type: &str, candidate_ids: Vec<Uuid>, parameters: serde_json::Value) -> BulkActionRequest {
    BulkActionRequest {
        action_type: action_type.to_string(),
        candidate_ids,
        parameters,
        requested_by: "recruiter-1".to_string(),
    }
}

/// Poll until the job reaches a terminal state; in-process dispatch runs on
/// a spawned task, so tests observe completion the way callers do
async fn wait_terminal(store: &InMemoryJobStore, job_id: Uuid) -> BulkActionJob {
    for _ in 0..500 {
        if let Some(job) = store.job_snapshot(job_id) {
            if job.state().is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}

#[tokio::test]
async fn scenario_tag_batch_completes_with_exactly_once_tags() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());

    // One candidate already carries the tag; idempotence must hold for it
    let mut ids: Vec<Uuid> = (0..9)
        .map(|i| candidates.insert(&format!("Cand{i}"), None, &[]))
        .collect();
    ids.push(candidates.insert("Tagged", None, &["bulk_contacted"]));

    let registry = full_registry(
        candidates.clone(),
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(5),
        None,
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request(
            "tag",
            ids.clone(),
            json!({"tag": "bulk_contacted"}),
        ))
        .await
        .unwrap();
    assert_eq!(accepted.total_count, 10);
    assert_eq!(accepted.dispatch, DispatchMode::InProcess);

    let job = wait_terminal(&store, accepted.job_id).await;
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.success_count + job.failed_count, 10);
    assert_eq!(job.failed_count, 0);
    assert_eq!(job.processed_count, 10);

    for id in ids {
        let candidate = candidates.snapshot(id).unwrap();
        let occurrences = candidate
            .tag_list()
            .iter()
            .filter(|t| *t == "bulk_contacted")
            .count();
        assert_eq!(occurrences, 1, "tag must be present exactly once");
    }
}

#[tokio::test]
async fn scenario_generation_outage_degrades_to_template_success() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids: Vec<Uuid> = (0..6)
        .map(|i| candidates.insert(&format!("Cand{i}"), Some("Acme"), &[]))
        .collect();

    let failing = Arc::new(FailingGenerativeClient::new());
    let registry = {
        let registry = ExecutorRegistry::new();
        registry
            .register(Arc::new(AddTagExecutor::new(candidates.clone())))
            .unwrap();
        registry
            .register(Arc::new(MoveStageExecutor::new(candidates.clone())))
            .unwrap();
        registry
            .register(Arc::new(PersonalizedEmailExecutor::new(
                candidates.clone(),
                Arc::new(MessageGenerationService::new(failing.clone())),
            )))
            .unwrap();
        Arc::new(registry)
    };
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(3),
        None,
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("personalized_email", ids, json!({})))
        .await
        .unwrap();
    let job = wait_terminal(&store, accepted.job_id).await;

    // Every item resolved via the fallback tier; an outage is degraded
    // success, never failure
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.failed_count, 0);
    assert_eq!(job.success_count, 6);
    assert_eq!(failing.call_count(), 6);

    for item in store.item_snapshots(accepted.job_id) {
        assert_eq!(item.state(), ItemState::Completed);
        let result = item.result.unwrap();
        assert_eq!(result["source"], "template");
        assert!(result["body"].as_str().unwrap().contains("Cand"));
    }
}

#[tokio::test]
async fn scenario_enqueue_failure_falls_back_to_in_process_run() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids: Vec<Uuid> = (0..4).map(|i| candidates.insert(&format!("C{i}"), None, &[])).collect();

    let queue = Arc::new(FailingJobQueue::new());
    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(2),
        Some(queue.clone()),
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("tag", ids, json!({"tag": "retry_q3"})))
        .await
        .unwrap();

    // The broker was tried once, failed, and the job ran anyway
    assert_eq!(accepted.dispatch, DispatchMode::InProcess);
    assert_eq!(queue.attempt_count(), 1);

    let job = wait_terminal(&store, accepted.job_id).await;
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.processed_count, 4);
    let pending = store
        .item_snapshots(accepted.job_id)
        .into_iter()
        .filter(|i| i.state() == ItemState::Pending)
        .count();
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn unavailable_queue_is_skipped_without_an_enqueue_attempt() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids = vec![candidates.insert("Solo", None, &[])];

    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(2),
        Some(Arc::new(UnavailableJobQueue::new())),
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("move_stage", ids, json!({"stage": "screen"})))
        .await
        .unwrap();
    assert_eq!(accepted.dispatch, DispatchMode::InProcess);

    let job = wait_terminal(&store, accepted.job_id).await;
    assert_eq!(job.state(), JobState::Completed);
}

#[tokio::test]
async fn healthy_queue_receives_the_job_and_a_worker_run_completes_it() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids: Vec<Uuid> = (0..3).map(|i| candidates.insert(&format!("C{i}"), None, &[])).collect();

    let queue = Arc::new(RecordingJobQueue::new());
    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(StaticGenerativeClient::new("hello"))),
    );
    let events = EventPublisher::default();
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry.clone(),
        ConcurrencyLimiter::new(2),
        Some(queue.clone()),
        events.clone(),
    );

    let accepted = orchestrator
        .submit(request("tag", ids, json!({"tag": "queued_path"})))
        .await
        .unwrap();
    assert_eq!(accepted.dispatch, DispatchMode::Queued);

    let enqueued = queue.enqueued();
    assert_eq!(enqueued.len(), 1);
    assert_eq!(enqueued[0].job_id, accepted.job_id);
    assert_eq!(enqueued[0].action_type, "tag");

    // Nothing ran yet; the queued consumer drives the same processor
    assert_eq!(
        store.job_snapshot(accepted.job_id).unwrap().state(),
        JobState::Pending
    );

    let processor = JobProcessor::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(2),
        events,
    );
    processor.process_job(accepted.job_id).await.unwrap();

    let job = store.job_snapshot(accepted.job_id).unwrap();
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.processed_count, 3);
}

#[tokio::test]
async fn reprocessing_a_terminal_job_never_double_counts() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids: Vec<Uuid> = (0..5).map(|i| candidates.insert(&format!("C{i}"), None, &[])).collect();

    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let events = EventPublisher::default();
    let processor = JobProcessor::new(
        store.clone(),
        registry.clone(),
        ConcurrencyLimiter::new(3),
        events.clone(),
    );

    let initializer = recruitops_core::orchestration::JobInitializer::new(
        store.clone(),
        registry,
        events,
    );
    let (job, _items) = initializer
        .create_job(&request("tag", ids, json!({"tag": "dup"})))
        .await
        .unwrap();

    processor.process_job(job.job_id).await.unwrap();
    // Simulated queue re-delivery of the same job
    processor.process_job(job.job_id).await.unwrap();

    let job = store.job_snapshot(job.job_id).unwrap();
    assert_eq!(job.processed_count, 5);
    assert_eq!(job.success_count, 5);
    assert!(job.counters().is_consistent());
}

/// Executor standing in for the tag handler that faults unexpectedly on one
/// chosen candidate
struct FaultingExecutor {
    poison: Uuid,
}

#[async_trait]
impl ActionExecutor for FaultingExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::Tag
    }

    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        if context.item.candidate_id == self.poison {
            return Err(ExecutorFault::Unexpected(
                "connection to candidate store lost".to_string(),
            ));
        }
        Ok(ExecutorResult::success(json!({"ok": true})))
    }
}

#[tokio::test]
async fn one_faulting_item_leaves_siblings_unaffected() {
    let store = Arc::new(InMemoryJobStore::new());
    let ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    let poison = ids[3];

    let registry = ExecutorRegistry::new();
    registry
        .register(Arc::new(FaultingExecutor { poison }))
        .unwrap();
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        Arc::new(registry),
        ConcurrencyLimiter::new(4),
        None,
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("tag", ids, json!({})))
        .await
        .unwrap();
    let job = wait_terminal(&store, accepted.job_id).await;

    // The batch finished; the fault is one item's failure, not the job's
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.success_count, 7);
    assert_eq!(job.failed_count, 1);

    for item in store.item_snapshots(accepted.job_id) {
        if item.candidate_id == poison {
            assert_eq!(item.state(), ItemState::Failed);
            assert!(item
                .error_message
                .as_deref()
                .unwrap()
                .contains("candidate store lost"));
        } else {
            assert_eq!(item.state(), ItemState::Completed);
        }
    }
}

/// Executor standing in for the tag handler that panics on one candidate
struct PanickingExecutor {
    poison: Uuid,
}

#[async_trait]
impl ActionExecutor for PanickingExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::Tag
    }

    async fn execute(
        &self,
        context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        assert!(
            context.item.candidate_id != self.poison,
            "executor blew up on poison candidate"
        );
        Ok(ExecutorResult::success(json!({"ok": true})))
    }
}

#[tokio::test]
async fn a_panicking_executor_becomes_that_items_failure() {
    let store = Arc::new(InMemoryJobStore::new());
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let poison = ids[0];

    let registry = ExecutorRegistry::new();
    registry
        .register(Arc::new(PanickingExecutor { poison }))
        .unwrap();
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        Arc::new(registry),
        ConcurrencyLimiter::new(2),
        None,
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("tag", ids, json!({})))
        .await
        .unwrap();
    let job = wait_terminal(&store, accepted.job_id).await;

    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.success_count, 3);

    let poisoned = store
        .item_snapshots(accepted.job_id)
        .into_iter()
        .find(|i| i.candidate_id == poison)
        .unwrap();
    assert_eq!(poisoned.state(), ItemState::Failed);
    assert!(poisoned.error_message.unwrap().contains("panicked"));
}

#[tokio::test]
async fn item_load_fault_fails_the_whole_job_with_an_error_log_entry() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids = vec![candidates.insert("C", None, &[])];

    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(2),
        None,
        EventPublisher::default(),
    );

    // Creation succeeds, then the item list becomes unreadable
    store.fail_item_loads(true);
    let accepted = orchestrator
        .submit(request("tag", ids, json!({"tag": "x"})))
        .await
        .unwrap();

    let job = wait_terminal(&store, accepted.job_id).await;
    assert_eq!(job.state(), JobState::Failed);
    assert!(job
        .errors()
        .iter()
        .any(|entry| entry.contains("Failed to load items")));
}

#[tokio::test]
async fn validation_errors_are_synchronous_and_leave_no_rows() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let id = candidates.insert("C", None, &[]);

    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(2),
        None,
        EventPublisher::default(),
    );

    // Empty candidate list
    let err = orchestrator
        .submit(request("tag", vec![], json!({"tag": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(_)));

    // Blank action type
    let err = orchestrator
        .submit(request("  ", vec![id], json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(_)));

    // Unknown action type
    let err = orchestrator
        .submit(request("delete_everything", vec![id], json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(_)));

    // Known action type, parameters the executor rejects
    let err = orchestrator
        .submit(request("tag", vec![id], json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(_)));

    assert_eq!(store.job_count(), 0, "no job row may exist after rejection");
}

#[tokio::test]
async fn status_reporter_returns_job_view_with_capped_recent_items() {
    let store = Arc::new(InMemoryJobStore::new());
    let candidates = Arc::new(InMemoryCandidateStore::new());
    let ids: Vec<Uuid> = (0..10)
        .map(|i| candidates.insert(&format!("C{i}"), None, &[]))
        .collect();

    let registry = full_registry(
        candidates,
        MessageGenerationService::new(Arc::new(FailingGenerativeClient::new())),
    );
    let orchestrator = BulkActionOrchestrator::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(4),
        None,
        EventPublisher::default(),
    );

    let accepted = orchestrator
        .submit(request("tag", ids, json!({"tag": "statused"})))
        .await
        .unwrap();
    wait_terminal(&store, accepted.job_id).await;

    let reporter = StatusReporter::new(store.clone(), 5);
    let view = reporter.job_status(accepted.job_id).await.unwrap();
    assert_eq!(view.status, JobState::Completed);
    assert_eq!(view.total_count, 10);
    assert_eq!(view.processed_count, 10);
    assert_eq!(view.recent_items.len(), 5, "recent items are capped");
    assert!(view
        .recent_items
        .iter()
        .all(|item| item.status.is_terminal()));

    let missing = reporter.job_status(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, StatusError::NotFound(_)));
}
