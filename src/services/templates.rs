//! # Template Catalog
//!
//! Admin surface for outreach templates and the lookup used by the
//! message-generation fallback tier.

use async_trait::async_trait;

use crate::models::{MessageTemplate, NewMessageTemplate};

/// Errors raised by template store implementations
#[derive(Debug, thiserror::Error)]
pub enum TemplateStoreError {
    #[error("Template '{0}' already exists")]
    DuplicateName(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Template catalog operations
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create(
        &self,
        new_template: &NewMessageTemplate,
    ) -> Result<MessageTemplate, TemplateStoreError>;

    async fn list(&self) -> Result<Vec<MessageTemplate>, TemplateStoreError>;

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<MessageTemplate>, TemplateStoreError>;
}

/// PostgreSQL-backed template catalog
pub struct PgTemplateStore {
    pool: sqlx::PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn create(
        &self,
        new_template: &NewMessageTemplate,
    ) -> Result<MessageTemplate, TemplateStoreError> {
        MessageTemplate::create(&self.pool, new_template)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    TemplateStoreError::DuplicateName(new_template.name.clone())
                }
                _ => TemplateStoreError::Database(e.to_string()),
            })
    }

    async fn list(&self) -> Result<Vec<MessageTemplate>, TemplateStoreError> {
        MessageTemplate::list(&self.pool)
            .await
            .map_err(|e| TemplateStoreError::Database(e.to_string()))
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<MessageTemplate>, TemplateStoreError> {
        MessageTemplate::find_by_name(&self.pool, name)
            .await
            .map_err(|e| TemplateStoreError::Database(e.to_string()))
    }
}
