//! # MessageTemplate Model
//!
//! Outreach templates consumed by the message-generation executors as the
//! deterministic fallback tier. Template names are unique; the admin surface
//! is create/list plus lookup by name.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Message template row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageTemplate {
    pub template_id: Uuid,
    pub name: String,
    /// Channel hint such as `email` or `linkedin`
    pub template_type: String,
    pub base_template: String,
    /// JSON array of variable names the template expects
    pub variables: Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Request to create a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageTemplate {
    pub name: String,
    pub template_type: String,
    pub base_template: String,
    pub variables: Value,
}

impl MessageTemplate {
    pub async fn create(
        pool: &PgPool,
        new_template: &NewMessageTemplate,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO message_templates
                (template_id, name, template_type, base_template, variables,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_template.name)
        .bind(&new_template.template_type)
        .bind(&new_template.base_template)
        .bind(&new_template.variables)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM message_templates ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM message_templates WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
