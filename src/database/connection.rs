//! PostgreSQL pool construction from configuration.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised while establishing the connection pool
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to database: {0}")]
    ConnectFailed(String),
}

/// Build a connection pool from the database configuration
pub async fn establish_pool(config: &DatabaseConfig) -> Result<PgPool, ConnectionError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| ConnectionError::ConnectFailed(e.to_string()))?;

    info!(
        max_connections = config.max_connections,
        "Database pool established"
    );
    Ok(pool)
}
