//! # Job Processor
//!
//! Drives one job's items to their terminal states. This is the shared
//! processing path: the queue consumer and the in-process fallback both
//! call [`JobProcessor::process_job`].
//!
//! Per item, the processor submits the executor call through the
//! concurrency limiter, writes the item's terminal result, then performs
//! the atomic counter increment. Finalization is driven by the increment's
//! returned snapshot (the task whose increment reaches `total_count`
//! finalizes the job), so "job done" is only ever declared after the last
//! item's terminal write has landed, and no completion re-query can race
//! the last writer.
//!
//! Every per-item execution is individually wrapped: an executor's
//! unexpected fault, and even a panic, becomes that item's recorded failure
//! and never aborts its siblings. Only top-level faults (the item list
//! cannot be loaded at all) fail the job as a whole.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::events::{lifecycle, EventPublisher};
use crate::execution::ConcurrencyLimiter;
use crate::executors::{ActionExecutor, ExecutionContext};
use crate::models::{BulkActionItem, JobCounters};
use crate::orchestration::job_finalizer::JobFinalizer;
use crate::orchestration::store::{JobStore, StoreError};
use crate::orchestration::types::{ActionType, ExecutorResult};
use crate::registry::ExecutorRegistry;
use crate::state_machine::ItemState;

/// Errors raised while processing a job
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// One or more item outcomes could not be recorded (store faults); the
    /// affected items remain pending for a later re-run
    #[error("Job {job_id}: {count} item outcome(s) could not be recorded")]
    OutcomesNotRecorded { job_id: Uuid, count: usize },

    /// A top-level fault failed the whole batch
    #[error("Job {job_id} failed: {reason}")]
    BatchFault { job_id: Uuid, reason: String },
}

/// Result of a processing run
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The job was already terminal; nothing to do
    AlreadyTerminal,
    /// The run finished; counters reflect the job row after the run
    Processed { counters: JobCounters },
}

/// Executes a job's items under bounded concurrency
pub struct JobProcessor {
    store: Arc<dyn JobStore>,
    registry: Arc<ExecutorRegistry>,
    limiter: ConcurrencyLimiter,
    events: EventPublisher,
    finalizer: JobFinalizer,
}

impl JobProcessor {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<ExecutorRegistry>,
        limiter: ConcurrencyLimiter,
        events: EventPublisher,
    ) -> Self {
        let finalizer = JobFinalizer::new(store.clone(), events.clone());
        Self {
            store,
            registry,
            limiter,
            events,
            finalizer,
        }
    }

    /// Run one job to a terminal state. Idempotent under re-delivery:
    /// already-terminal items are skipped and never double-counted.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn process_job(&self, job_id: Uuid) -> Result<JobOutcome, ProcessingError> {
        let job = self.store.get_job(job_id).await?;
        if job.state().is_terminal() {
            debug!(job_id = %job_id, status = %job.status, "Job already terminal");
            return Ok(JobOutcome::AlreadyTerminal);
        }

        let started = self.store.mark_processing(job_id).await?;
        if started {
            let _ = self.events.publish(
                lifecycle::JOB_STARTED,
                json!({"job_id": job_id, "action_type": job.action_type}),
            );
        }

        // Faults from here on prevent the batch from running at all and
        // fail the job, distinct from per-item failures below
        let action_type: ActionType = match job.action_type.parse() {
            Ok(parsed) => parsed,
            Err(e) => return self.batch_fault(job_id, &format!("Unprocessable job: {e}")).await,
        };
        let executor = match self.registry.resolve(action_type) {
            Ok(executor) => executor,
            Err(e) => return self.batch_fault(job_id, &e.to_string()).await,
        };
        let items = match self.store.list_items(job_id).await {
            Ok(items) => items,
            Err(e) => {
                return self
                    .batch_fault(job_id, &format!("Failed to load items: {e}"))
                    .await
            }
        };

        let pending: Vec<BulkActionItem> = items
            .into_iter()
            .filter(|item| item.state() == ItemState::Pending)
            .collect();

        if pending.is_empty() {
            // Re-delivered job whose items all finished earlier; make sure
            // the terminal write landed
            let counters = job.counters();
            if counters.is_complete() {
                self.finalizer.complete(job_id, &counters).await?;
            }
            let job = self.store.get_job(job_id).await?;
            return Ok(JobOutcome::Processed {
                counters: job.counters(),
            });
        }

        info!(
            job_id = %job_id,
            pending = pending.len(),
            max_concurrent = self.limiter.max(),
            "Dispatching items"
        );

        let parameters = Arc::new(job.parameters.clone());
        let mut handles = Vec::with_capacity(pending.len());
        for item in pending {
            let store = self.store.clone();
            let events = self.events.clone();
            let finalizer = self.finalizer.clone();
            let limiter = self.limiter.clone();
            let executor = executor.clone();
            let parameters = parameters.clone();
            let item_id = item.item_id;

            let handle = tokio::spawn(async move {
                limiter
                    .run(Self::process_item(
                        store, events, finalizer, executor, item, parameters,
                    ))
                    .await
            });
            handles.push((item_id, handle));
        }

        let (item_ids, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let settlements = futures::future::join_all(joins).await;

        let mut unrecorded = 0usize;
        for (item_id, settled) in item_ids.into_iter().zip(settlements) {
            match settled {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    unrecorded += 1;
                    error!(
                        job_id = %job_id,
                        item_id = %item_id,
                        error = %e,
                        "Item outcome could not be recorded"
                    );
                }
                Err(join_error) => {
                    // The executor panicked before reaching its terminal
                    // write; record the panic as this item's failure
                    let outcome =
                        ExecutorResult::failure(format!("Executor panicked: {join_error}"));
                    match Self::record_outcome(
                        &self.store,
                        &self.events,
                        &self.finalizer,
                        job_id,
                        item_id,
                        &outcome,
                    )
                    .await
                    {
                        Ok(_) => {}
                        Err(e) => {
                            unrecorded += 1;
                            error!(
                                job_id = %job_id,
                                item_id = %item_id,
                                error = %e,
                                "Panicked item outcome could not be recorded"
                            );
                        }
                    }
                }
            }
        }

        if unrecorded > 0 {
            return Err(ProcessingError::OutcomesNotRecorded {
                job_id,
                count: unrecorded,
            });
        }

        // Reporting only; finalization already happened inside the task
        // whose increment crossed total_count
        let job = self.store.get_job(job_id).await?;
        Ok(JobOutcome::Processed {
            counters: job.counters(),
        })
    }

    /// Execute one item and record its outcome. The executor's `Err`
    /// channel (unexpected faults) is converted into an item failure here,
    /// the per-item boundary from which siblings are isolated.
    async fn process_item(
        store: Arc<dyn JobStore>,
        events: EventPublisher,
        finalizer: JobFinalizer,
        executor: Arc<dyn ActionExecutor>,
        item: BulkActionItem,
        parameters: Arc<Value>,
    ) -> Result<Option<JobCounters>, StoreError> {
        let context = ExecutionContext {
            item: &item,
            parameters: &parameters,
        };
        let outcome = match executor.execute(context).await {
            Ok(result) => result,
            Err(fault) => {
                warn!(
                    item_id = %item.item_id,
                    candidate_id = %item.candidate_id,
                    error = %fault,
                    "Executor fault recorded as item failure"
                );
                ExecutorResult::failure(fault.to_string())
            }
        };

        Self::record_outcome(
            &store,
            &events,
            &finalizer,
            item.job_id,
            item.item_id,
            &outcome,
        )
        .await
    }

    /// Terminal write, then atomic counter increment, then finalization if
    /// this increment completed the job. Returns `None` when the item was
    /// already terminal (nothing recorded, nothing counted).
    async fn record_outcome(
        store: &Arc<dyn JobStore>,
        events: &EventPublisher,
        finalizer: &JobFinalizer,
        job_id: Uuid,
        item_id: Uuid,
        outcome: &ExecutorResult,
    ) -> Result<Option<JobCounters>, StoreError> {
        let wrote = store.update_item_result(item_id, outcome).await?;
        if !wrote {
            debug!(item_id = %item_id, "Item already terminal, skipping counters");
            return Ok(None);
        }

        let event_name = if outcome.success {
            lifecycle::ITEM_COMPLETED
        } else {
            lifecycle::ITEM_FAILED
        };
        let _ = events.publish(
            event_name,
            json!({
                "job_id": job_id,
                "item_id": item_id,
                "error": outcome.error,
            }),
        );

        let counters = store.increment_counters(job_id, outcome.success).await?;
        if counters.is_complete() {
            finalizer.complete(job_id, &counters).await?;
        }
        Ok(Some(counters))
    }

    /// Fail the whole batch on a top-level fault
    async fn batch_fault(
        &self,
        job_id: Uuid,
        reason: &str,
    ) -> Result<JobOutcome, ProcessingError> {
        self.finalizer.fail(job_id, reason).await?;
        Err(ProcessingError::BatchFault {
            job_id,
            reason: reason.to_string(),
        })
    }
}
