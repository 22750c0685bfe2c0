//! # PGMQ Client
//!
//! Thin wrapper over the pgmq extension's SQL functions, driven through the
//! existing sqlx pool. The broker is best-effort by design: every call
//! surfaces its error to the caller, and the queue adapter layered on top
//! decides whether to degrade to in-process execution.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::debug;

/// Errors raised by queue operations
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Queue payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A message read from a queue
#[derive(Debug, Clone)]
pub struct PgmqMessage {
    pub msg_id: i64,
    /// Delivery count, including this read
    pub read_ct: i32,
    pub enqueued_at: DateTime<Utc>,
    pub vt: DateTime<Utc>,
    pub message: Value,
}

/// Client for pgmq-backed queues
#[derive(Debug, Clone)]
pub struct PgmqClient {
    pool: PgPool,
}

impl PgmqClient {
    pub fn new_with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the queue if it does not exist. Fails when the pgmq extension
    /// is not installed, which is how queue availability is probed.
    pub async fn create_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        sqlx::query("SELECT pgmq.create($1)")
            .bind(queue_name)
            .execute(&self.pool)
            .await?;
        debug!(queue = queue_name, "Ensured queue exists");
        Ok(())
    }

    /// Send a JSON payload; returns the message id
    pub async fn send_json_message<T: serde::Serialize>(
        &self,
        queue_name: &str,
        message: &T,
    ) -> Result<i64, MessagingError> {
        let payload = serde_json::to_value(message)?;
        let row = sqlx::query("SELECT pgmq.send($1, $2) AS msg_id")
            .bind(queue_name)
            .bind(&payload)
            .fetch_one(&self.pool)
            .await?;
        let msg_id: i64 = row.get("msg_id");
        debug!(queue = queue_name, msg_id = msg_id, "Sent queue message");
        Ok(msg_id)
    }

    /// Read up to `qty` messages, making them invisible for `vt_seconds`
    pub async fn read_messages(
        &self,
        queue_name: &str,
        vt_seconds: i32,
        qty: i32,
    ) -> Result<Vec<PgmqMessage>, MessagingError> {
        let rows = sqlx::query(
            "SELECT msg_id, read_ct, enqueued_at, vt, message FROM pgmq.read($1, $2, $3)",
        )
        .bind(queue_name)
        .bind(vt_seconds)
        .bind(qty)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PgmqMessage {
                msg_id: row.get("msg_id"),
                read_ct: row.get("read_ct"),
                enqueued_at: row.get("enqueued_at"),
                vt: row.get("vt"),
                message: row.get("message"),
            })
            .collect())
    }

    /// Delete a message after successful processing
    pub async fn delete_message(
        &self,
        queue_name: &str,
        msg_id: i64,
    ) -> Result<(), MessagingError> {
        sqlx::query("SELECT pgmq.delete($1, $2)")
            .bind(queue_name)
            .bind(msg_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Move a poison message to the queue's archive table
    pub async fn archive_message(
        &self,
        queue_name: &str,
        msg_id: i64,
    ) -> Result<(), MessagingError> {
        sqlx::query("SELECT pgmq.archive($1, $2)")
            .bind(queue_name)
            .bind(msg_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
