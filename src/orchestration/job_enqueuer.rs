//! # Job Enqueuer
//!
//! Optional distributed dispatch. The queue exists purely for scale, never
//! for correctness: the orchestrator consults [`JobQueue::is_available`]
//! before every enqueue attempt and treats any failure (construction,
//! enqueue, or dispatch) as a signal to run the job in-process instead.
//! Every accepted job is eventually processed regardless of broker health.
//!
//! Construction-time unavailability (pgmq extension missing, broker
//! unreachable) sets a persistent unavailable flag rather than retrying
//! indefinitely; later transient `enqueue` failures surface as errors that
//! the orchestrator catches and absorbs into the fallback path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::messaging::{MessagingError, PgmqClient};
use crate::orchestration::types::JobQueueMessage;

/// Errors raised by enqueue attempts
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Queue adapter is unavailable")]
    Unavailable,

    #[error("Enqueue failed: {0}")]
    SendFailed(String),
}

impl From<MessagingError> for EnqueueError {
    fn from(err: MessagingError) -> Self {
        EnqueueError::SendFailed(err.to_string())
    }
}

/// Distributed dispatch seam for accepted jobs
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Hand a job to the distributed queue
    async fn enqueue_job(&self, message: &JobQueueMessage) -> Result<(), EnqueueError>;

    /// Whether the adapter believes the broker is usable; checked by the
    /// orchestrator before every enqueue attempt
    fn is_available(&self) -> bool;

    /// Name of the underlying queue, for logging
    fn queue_name(&self) -> &str;
}

/// pgmq-backed job queue
pub struct PgmqJobQueue {
    client: PgmqClient,
    queue_name: String,
    available: AtomicBool,
}

impl PgmqJobQueue {
    /// Construct the adapter and probe the broker once by ensuring the
    /// queue exists. On probe failure the adapter comes up permanently
    /// unavailable; the engine degrades to in-process execution instead of
    /// retrying the broker.
    pub async fn initialize(pool: sqlx::PgPool, queue_name: &str) -> Self {
        let client = PgmqClient::new_with_pool(pool);
        let queue = Self {
            client,
            queue_name: queue_name.to_string(),
            available: AtomicBool::new(true),
        };

        match queue.client.create_queue(queue_name).await {
            Ok(()) => {
                info!(queue = queue_name, "Queue adapter initialized");
            }
            Err(e) => {
                warn!(
                    queue = queue_name,
                    error = %e,
                    "Queue adapter unavailable, jobs will run in-process"
                );
                queue.available.store(false, Ordering::Release);
            }
        }
        queue
    }
}

#[async_trait]
impl JobQueue for PgmqJobQueue {
    async fn enqueue_job(&self, message: &JobQueueMessage) -> Result<(), EnqueueError> {
        if !self.is_available() {
            return Err(EnqueueError::Unavailable);
        }
        self.client
            .send_json_message(&self.queue_name, message)
            .await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}
