//! # Bulk Action Orchestrator
//!
//! The engine's front door. Owns the injected collaborators (job store,
//! executor registry, optional queue adapter, processor) and implements
//! the dual-mode dispatch decision: hand an accepted job to the distributed
//! queue when it is available, otherwise run it in-process. Dispatch can
//! degrade but never lose a job; once `submit` returns, the job will reach
//! a terminal state regardless of broker health.
//!
//! All collaborators arrive at construction time (no process-wide
//! singletons); the process entry point owns them.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::events::{lifecycle, EventPublisher};
use crate::execution::ConcurrencyLimiter;
use crate::models::BulkActionJob;
use crate::orchestration::job_enqueuer::JobQueue;
use crate::orchestration::job_initializer::{JobInitializer, SubmissionError};
use crate::orchestration::job_processor::JobProcessor;
use crate::orchestration::store::JobStore;
use crate::orchestration::types::{
    BulkActionAccepted, BulkActionRequest, DispatchMode, JobQueueMessage,
};
use crate::registry::ExecutorRegistry;

/// Orchestrates job acceptance and dispatch
pub struct BulkActionOrchestrator {
    initializer: JobInitializer,
    processor: Arc<JobProcessor>,
    queue: Option<Arc<dyn JobQueue>>,
    events: EventPublisher,
}

impl BulkActionOrchestrator {
    /// Wire the orchestrator from its collaborators. `queue` is optional;
    /// without it every job runs in-process.
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<ExecutorRegistry>,
        limiter: ConcurrencyLimiter,
        queue: Option<Arc<dyn JobQueue>>,
        events: EventPublisher,
    ) -> Self {
        let initializer = JobInitializer::new(store.clone(), registry.clone(), events.clone());
        let processor = Arc::new(JobProcessor::new(
            store,
            registry,
            limiter,
            events.clone(),
        ));
        Self {
            initializer,
            processor,
            queue,
            events,
        }
    }

    /// The shared processing path, for queue consumers
    pub fn processor(&self) -> Arc<JobProcessor> {
        self.processor.clone()
    }

    /// Accept and dispatch a bulk action request.
    ///
    /// Validation errors are synchronous and leave no rows. After this
    /// returns, the job's progress is observable only through the status
    /// query, and it is guaranteed to reach a terminal state.
    #[instrument(skip(self, request), fields(action_type = %request.action_type))]
    pub async fn submit(
        &self,
        request: BulkActionRequest,
    ) -> Result<BulkActionAccepted, SubmissionError> {
        let (job, _items) = self.initializer.create_job(&request).await?;
        let dispatch = self.dispatch(&job).await;

        Ok(BulkActionAccepted {
            job_id: job.job_id,
            status: job.state(),
            total_count: job.total_count,
            dispatch,
        })
    }

    /// Queue-vs-inline dispatch. Any queue failure falls through to the
    /// in-process run; this method itself cannot fail.
    async fn dispatch(&self, job: &BulkActionJob) -> DispatchMode {
        if let Some(queue) = &self.queue {
            if queue.is_available() {
                let message = JobQueueMessage::new(job.job_id, &job.action_type);
                match queue.enqueue_job(&message).await {
                    Ok(()) => {
                        let _ = self.events.publish(
                            lifecycle::JOB_ENQUEUED,
                            json!({"job_id": job.job_id, "queue": queue.queue_name()}),
                        );
                        debug!(job_id = %job.job_id, queue = queue.queue_name(), "Job enqueued");
                        return DispatchMode::Queued;
                    }
                    Err(e) => {
                        warn!(
                            job_id = %job.job_id,
                            error = %e,
                            "Enqueue failed, falling back to in-process execution"
                        );
                    }
                }
            } else {
                debug!(job_id = %job.job_id, "Queue adapter unavailable, running in-process");
            }
        }

        let _ = self.events.publish(
            lifecycle::JOB_DISPATCHED_INLINE,
            json!({"job_id": job.job_id}),
        );

        let processor = self.processor.clone();
        let job_id = job.job_id;
        tokio::spawn(async move {
            match processor.process_job(job_id).await {
                Ok(_) => {
                    info!(job_id = %job_id, "In-process job run finished");
                }
                Err(e) => {
                    // The processor has already recorded the failure on the
                    // job where possible; nothing is lost silently
                    warn!(job_id = %job_id, error = %e, "In-process job run failed");
                }
            }
        });
        DispatchMode::InProcess
    }
}
