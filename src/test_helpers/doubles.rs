//! Scriptable test doubles for the engine's external collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::orchestration::job_enqueuer::{EnqueueError, JobQueue};
use crate::orchestration::types::JobQueueMessage;
use crate::services::generation::{GenerationError, GenerationRequest, GenerativeClient};

/// [`GenerativeClient`] returning a fixed body, counting calls
pub struct StaticGenerativeClient {
    body: String,
    calls: AtomicUsize,
}

impl StaticGenerativeClient {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeClient for StaticGenerativeClient {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// [`GenerativeClient`] that errors on every call, forcing the template
/// fallback tier
pub struct FailingGenerativeClient {
    calls: AtomicUsize,
}

impl FailingGenerativeClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingGenerativeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeClient for FailingGenerativeClient {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::RequestFailed(
            "generation service unavailable".to_string(),
        ))
    }
}

/// [`JobQueue`] that accepts every message and records it for assertions
#[derive(Default)]
pub struct RecordingJobQueue {
    enqueued: Mutex<Vec<JobQueueMessage>>,
}

impl RecordingJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueued(&self) -> Vec<JobQueueMessage> {
        self.enqueued.lock().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingJobQueue {
    async fn enqueue_job(&self, message: &JobQueueMessage) -> Result<(), EnqueueError> {
        self.enqueued.lock().push(message.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn queue_name(&self) -> &str {
        "recording_queue"
    }
}

/// [`JobQueue`] that reports available but fails every enqueue, simulating
/// a broker that dies between acceptance and dispatch
#[derive(Default)]
pub struct FailingJobQueue {
    attempts: AtomicUsize,
}

impl FailingJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobQueue for FailingJobQueue {
    async fn enqueue_job(&self, _message: &JobQueueMessage) -> Result<(), EnqueueError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EnqueueError::SendFailed(
            "broker connection reset".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn queue_name(&self) -> &str {
        "failing_queue"
    }
}

/// [`JobQueue`] whose construction-time probe failed; permanently
/// unavailable, enqueue is never reached
#[derive(Default)]
pub struct UnavailableJobQueue;

impl UnavailableJobQueue {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobQueue for UnavailableJobQueue {
    async fn enqueue_job(&self, _message: &JobQueueMessage) -> Result<(), EnqueueError> {
        Err(EnqueueError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }

    fn queue_name(&self) -> &str {
        "unavailable_queue"
    }
}
