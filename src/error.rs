//! Crate-level error type.
//!
//! Component modules define their own focused error enums (for example
//! [`crate::orchestration::store::StoreError`] or
//! [`crate::registry::RegistryError`]); this type is the coarse-grained
//! aggregate used at composition boundaries such as the worker binary and
//! the platform's service layer embedding the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecruitOpsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Orchestration error: {0}")]
    Orchestration(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Event error: {0}")]
    Event(String),
}

pub type Result<T> = std::result::Result<T, RecruitOpsError>;

impl From<sqlx::Error> for RecruitOpsError {
    fn from(err: sqlx::Error) -> Self {
        RecruitOpsError::Database(err.to_string())
    }
}
