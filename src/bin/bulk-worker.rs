//! # Bulk Action Worker
//!
//! Distributed consumer for queued bulk action jobs. This is the composition
//! root: it loads configuration, connects the database pool, runs schema
//! migrations, wires the executor registry and job processor, and polls the
//! job queue until shutdown. All collaborators are constructed here and
//! injected; the engine itself holds no process-wide state.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use recruitops_core::config::ConfigManager;
use recruitops_core::database::{establish_pool, MigrationRunner};
use recruitops_core::events::EventPublisher;
use recruitops_core::execution::ConcurrencyLimiter;
use recruitops_core::executors::{AddTagExecutor, MoveStageExecutor, PersonalizedEmailExecutor};
use recruitops_core::logging::init_logging;
use recruitops_core::messaging::PgmqClient;
use recruitops_core::orchestration::{JobProcessor, PgJobStore, QueueWorker};
use recruitops_core::registry::ExecutorRegistry;
use recruitops_core::services::candidates::PgCandidateStore;
use recruitops_core::services::generation::{HttpGenerativeClient, MessageGenerationService};
use recruitops_core::services::templates::PgTemplateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = ConfigManager::load().context("failed to load configuration")?;
    if !config.queue.enabled {
        anyhow::bail!(
            "queue is disabled in configuration; the worker has nothing to consume \
             (in-process dispatch needs no worker)"
        );
    }

    let pool = establish_pool(&config.database)
        .await
        .context("failed to establish database pool")?;
    MigrationRunner::run(&pool)
        .await
        .context("failed to run schema migrations")?;

    let store = Arc::new(PgJobStore::new(pool.clone()));
    let candidates = Arc::new(PgCandidateStore::new(pool.clone()));
    let templates = Arc::new(PgTemplateStore::new(pool.clone()));
    let generation = Arc::new(MessageGenerationService::with_templates(
        Arc::new(
            HttpGenerativeClient::from_config(&config.generation)
                .context("failed to build generation client")?,
        ),
        templates,
    ));

    let registry = Arc::new(ExecutorRegistry::new());
    registry.register(Arc::new(AddTagExecutor::new(candidates.clone())))?;
    registry.register(Arc::new(MoveStageExecutor::new(candidates.clone())))?;
    registry.register(Arc::new(PersonalizedEmailExecutor::new(
        candidates, generation,
    )))?;
    registry.validate_complete()?;

    let limiter =
        ConcurrencyLimiter::new(config.orchestration.effective_max_concurrent_items());
    let events = EventPublisher::default();
    let processor = Arc::new(JobProcessor::new(store, registry, limiter, events));

    let client = PgmqClient::new_with_pool(pool);
    if let Err(e) = client.create_queue(&config.queue.queue_name).await {
        warn!(
            queue = %config.queue.queue_name,
            error = %e,
            "Could not ensure queue exists; polling will retry"
        );
    }
    let worker = QueueWorker::new(client, processor, &config.queue);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(queue = %config.queue.queue_name, "Bulk action worker starting");
    worker.run(shutdown_rx).await;
    Ok(())
}
