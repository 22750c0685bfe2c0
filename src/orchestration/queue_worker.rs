//! # Queue Worker
//!
//! Distributed consumer for the job queue. Reads job messages, drives the
//! same [`JobProcessor`] the in-process fallback path uses, deletes
//! messages once the job reaches a terminal state, and archives poison
//! messages after repeated delivery failures.
//!
//! Processing is idempotent (terminal item writes are guarded, counters
//! only move on real writes), so a message re-delivered after a crash
//! re-runs only the items that never finished.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::messaging::{PgmqClient, PgmqMessage};
use crate::orchestration::job_processor::JobProcessor;
use crate::orchestration::types::JobQueueMessage;

/// Deliveries before a message is considered poison and archived
const MAX_DELIVERY_ATTEMPTS: i32 = 3;

/// Polling consumer that executes queued jobs
pub struct QueueWorker {
    client: PgmqClient,
    processor: Arc<JobProcessor>,
    queue_name: String,
    poll_interval: Duration,
    batch_size: i32,
    visibility_timeout_seconds: i32,
}

impl QueueWorker {
    pub fn new(client: PgmqClient, processor: Arc<JobProcessor>, config: &QueueConfig) -> Self {
        Self {
            client,
            processor,
            queue_name: config.queue_name.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            batch_size: config.batch_size,
            visibility_timeout_seconds: config.visibility_timeout_seconds,
        }
    }

    /// Poll until the shutdown signal flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            queue = %self.queue_name,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Queue worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_once().await {
                Ok(0) => {
                    // Idle; wait for the next poll or shutdown
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
                Ok(processed) => {
                    debug!(queue = %self.queue_name, processed, "Processed queue batch");
                }
                Err(e) => {
                    warn!(queue = %self.queue_name, error = %e, "Queue poll failed");
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }

        info!(queue = %self.queue_name, "Queue worker stopped");
    }

    /// Read and process one batch; returns how many messages were handled
    pub async fn run_once(&self) -> Result<usize, crate::messaging::MessagingError> {
        let messages = self
            .client
            .read_messages(
                &self.queue_name,
                self.visibility_timeout_seconds,
                self.batch_size,
            )
            .await?;

        let count = messages.len();
        for message in messages {
            self.handle_message(message).await;
        }
        Ok(count)
    }

    async fn handle_message(&self, message: PgmqMessage) {
        let job_message = match parse_payload(&message.message) {
            Some(parsed) => parsed,
            None => {
                warn!(
                    msg_id = message.msg_id,
                    "Unparseable queue message, archiving"
                );
                self.archive(message.msg_id).await;
                return;
            }
        };

        match self.processor.process_job(job_message.job_id).await {
            Ok(_) => {
                if let Err(e) = self
                    .client
                    .delete_message(&self.queue_name, message.msg_id)
                    .await
                {
                    // The job is terminal; re-delivery will be a no-op
                    warn!(msg_id = message.msg_id, error = %e, "Failed to delete processed message");
                }
            }
            Err(e) => {
                error!(
                    job_id = %job_message.job_id,
                    msg_id = message.msg_id,
                    attempt = message.read_ct,
                    error = %e,
                    "Queued job processing failed"
                );
                if message.read_ct >= MAX_DELIVERY_ATTEMPTS {
                    warn!(
                        msg_id = message.msg_id,
                        attempts = message.read_ct,
                        "Delivery limit reached, archiving message"
                    );
                    self.archive(message.msg_id).await;
                }
                // Otherwise leave the message; it re-appears after the
                // visibility timeout and re-runs only unfinished items
            }
        }
    }

    async fn archive(&self, msg_id: i64) {
        if let Err(e) = self.client.archive_message(&self.queue_name, msg_id).await {
            error!(msg_id, error = %e, "Failed to archive message");
        }
    }
}

fn parse_payload(payload: &Value) -> Option<JobQueueMessage> {
    serde_json::from_value(payload.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn parses_queue_payload() {
        let job_id = Uuid::new_v4();
        let message = JobQueueMessage::new(job_id, "tag");
        let payload = serde_json::to_value(&message).unwrap();

        let parsed = parse_payload(&payload).unwrap();
        assert_eq!(parsed.job_id, job_id);
        assert_eq!(parsed.action_type, "tag");
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(parse_payload(&json!({"nonsense": true})).is_none());
        assert!(parse_payload(&json!("just a string")).is_none());
    }
}
