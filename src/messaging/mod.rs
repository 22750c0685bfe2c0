//! PostgreSQL message queue (pgmq) based messaging for job dispatch.

pub mod pgmq_client;

pub use pgmq_client::{MessagingError, PgmqClient, PgmqMessage};
