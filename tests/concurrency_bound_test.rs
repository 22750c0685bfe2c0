//! # Concurrency Bound Tests
//!
//! Instrumented executors run through the full processing path and record
//! how many of them were ever active at once; the limiter's bound must hold
//! for any batch size at or above it.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use recruitops_core::events::EventPublisher;
use recruitops_core::execution::ConcurrencyLimiter;
use recruitops_core::executors::{ActionExecutor, ExecutionContext, ExecutorFault};
use recruitops_core::orchestration::{ActionType, ExecutorResult, JobInitializer, JobProcessor};
use recruitops_core::orchestration::BulkActionRequest;
use recruitops_core::registry::ExecutorRegistry;
use recruitops_core::test_helpers::InMemoryJobStore;

/// Executor that tracks its own concurrent activations
struct InstrumentedExecutor {
    active: AtomicUsize,
    max_seen: AtomicUsize,
}

impl InstrumentedExecutor {
    fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ActionExecutor for InstrumentedExecutor {
    fn action_type(&self) -> ActionType {
        ActionType::Tag
    }

    async fn execute(
        &self,
        _context: ExecutionContext<'_>,
    ) -> Result<ExecutorResult, ExecutorFault> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        // Hold the slot across a suspension point so overlap is observable
        tokio::time::sleep(Duration::from_millis(15)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ExecutorResult::success(json!({})))
    }
}

async fn run_batch(limit: usize, batch: usize) -> (usize, i32) {
    let store = Arc::new(InMemoryJobStore::new());
    let executor = Arc::new(InstrumentedExecutor::new());

    let registry = ExecutorRegistry::new();
    registry.register(executor.clone()).unwrap();
    let registry = Arc::new(registry);

    let events = EventPublisher::default();
    let initializer = JobInitializer::new(store.clone(), registry.clone(), events.clone());
    let processor = JobProcessor::new(
        store.clone(),
        registry,
        ConcurrencyLimiter::new(limit),
        events,
    );

    let request = BulkActionRequest {
        action_type: "tag".to_string(),
        candidate_ids: (0..batch).map(|_| Uuid::new_v4()).collect(),
        parameters: json!({}),
        requested_by: "load-test".to_string(),
    };
    let (job, _items) = initializer.create_job(&request).await.unwrap();
    processor.process_job(job.job_id).await.unwrap();

    let job = store.job_snapshot(job.job_id).unwrap();
    (executor.max_seen.load(Ordering::SeqCst), job.processed_count)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bound_of_three_is_never_exceeded_by_a_larger_batch() {
    let (max_seen, processed) = run_batch(3, 20).await;
    assert!(max_seen <= 3, "observed {max_seen} concurrent executors");
    assert_eq!(processed, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bound_of_one_serializes_the_batch() {
    let (max_seen, processed) = run_batch(1, 8).await;
    assert_eq!(max_seen, 1);
    assert_eq!(processed, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_at_the_bound_can_saturate_it() {
    let (max_seen, processed) = run_batch(5, 5).await;
    assert!(max_seen <= 5);
    assert_eq!(processed, 5);
}
