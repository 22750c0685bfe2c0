//! Schema migrations for the bulk action engine.
//!
//! Migrations are inline SQL applied in order and tracked in a version
//! table, so a worker process can bootstrap its own schema. The
//! `candidates` table is owned by the platform schema in production
//! deployments; it is created here with `IF NOT EXISTS` so the engine also
//! runs standalone.

use sqlx::PgPool;
use tracing::{debug, info};

/// Errors raised while applying migrations
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration '{name}' failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_create_bulk_action_jobs",
        r#"
        CREATE TABLE IF NOT EXISTS bulk_action_jobs (
            job_id UUID PRIMARY KEY,
            action_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
            total_count INTEGER NOT NULL CHECK (total_count > 0),
            processed_count INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            failed_count INTEGER NOT NULL DEFAULT 0,
            parameters JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_by TEXT NOT NULL,
            error_log JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMP NOT NULL DEFAULT NOW(),
            started_at TIMESTAMP,
            completed_at TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
            CHECK (processed_count = success_count + failed_count),
            CHECK (processed_count <= total_count)
        );
        CREATE INDEX IF NOT EXISTS idx_bulk_action_jobs_status
            ON bulk_action_jobs (status, created_at);
        "#,
    ),
    (
        "0002_create_bulk_action_items",
        r#"
        CREATE TABLE IF NOT EXISTS bulk_action_items (
            item_id UUID PRIMARY KEY,
            job_id UUID NOT NULL REFERENCES bulk_action_jobs (job_id) ON DELETE CASCADE,
            candidate_id UUID NOT NULL,
            action_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'completed', 'failed')),
            result JSONB,
            error_message TEXT,
            processed_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT NOW()
        );
        CREATE INDEX IF NOT EXISTS idx_bulk_action_items_job_status
            ON bulk_action_items (job_id, status);
        CREATE INDEX IF NOT EXISTS idx_bulk_action_items_job_processed
            ON bulk_action_items (job_id, processed_at DESC);
        "#,
    ),
    (
        "0003_create_message_templates",
        r#"
        CREATE TABLE IF NOT EXISTS message_templates (
            template_id UUID PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            template_type TEXT NOT NULL,
            base_template TEXT NOT NULL,
            variables JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMP NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "0004_create_candidates",
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            candidate_id UUID PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            email TEXT,
            company TEXT,
            title TEXT,
            pipeline_stage TEXT,
            tags JSONB NOT NULL DEFAULT '[]'::jsonb,
            updated_at TIMESTAMP NOT NULL DEFAULT NOW()
        );
        "#,
    ),
];

/// Applies pending migrations at startup
pub struct MigrationRunner;

impl MigrationRunner {
    /// Apply all unapplied migrations in order
    pub async fn run(pool: &PgPool) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recruitops_schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMP NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await?;

        let mut applied = 0usize;
        for (name, sql) in MIGRATIONS {
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT name FROM recruitops_schema_migrations WHERE name = $1")
                    .bind(name)
                    .fetch_optional(pool)
                    .await?;
            if exists.is_some() {
                debug!(migration = name, "Migration already applied");
                continue;
            }

            let mut tx = pool.begin().await?;
            sqlx::raw_sql(sql)
                .execute(&mut *tx)
                .await
                .map_err(|source| MigrationError::Failed {
                    name: (*name).to_string(),
                    source,
                })?;
            sqlx::query("INSERT INTO recruitops_schema_migrations (name) VALUES ($1)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!(migration = name, "Applied migration");
            applied += 1;
        }

        if applied > 0 {
            info!(count = applied, "Schema migrations complete");
        }
        Ok(())
    }
}
