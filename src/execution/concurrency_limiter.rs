//! # Concurrency Limiter
//!
//! A pure scheduling primitive bounding simultaneous in-flight async
//! operations. Under the bound, tasks start immediately; at the bound they
//! queue FIFO (the underlying semaphore is fair) and start as slots free.
//!
//! The limiter has no notion of task identity and no priority policy; each
//! task's outcome is independent, and a failing task releases its slot like
//! any other. Clones share the same permit pool.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::DEFAULT_MAX_CONCURRENT_ITEMS;

/// Bounds the number of concurrently running async tasks
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter with the given bound. A zero bound would deadlock
    /// every caller, so it falls back to [`DEFAULT_MAX_CONCURRENT_ITEMS`].
    pub fn new(max: usize) -> Self {
        let max = if max == 0 {
            warn!(
                fallback = DEFAULT_MAX_CONCURRENT_ITEMS,
                "Concurrency limit of zero requested, using default"
            );
            DEFAULT_MAX_CONCURRENT_ITEMS
        } else {
            max
        };
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Create a limiter from a raw configured value; non-positive values
    /// fall back to the default rather than deadlocking
    pub fn from_config(configured: i64) -> Self {
        if configured <= 0 {
            warn!(
                configured,
                fallback = DEFAULT_MAX_CONCURRENT_ITEMS,
                "Non-positive concurrency limit configured, using default"
            );
            Self::new(DEFAULT_MAX_CONCURRENT_ITEMS)
        } else {
            Self::new(configured as usize)
        }
    }

    /// Run a task under the bound, waiting FIFO for a slot when saturated
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        match self.semaphore.acquire().await {
            Ok(_permit) => task.await,
            // Unreachable while the limiter exists (the semaphore is never
            // closed); run unbounded rather than losing the task
            Err(_) => {
                warn!("Limiter semaphore closed, running task without a slot");
                task.await
            }
        }
    }

    /// The configured bound
    pub fn max(&self) -> usize {
        self.max
    }

    /// Free slots right now
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
