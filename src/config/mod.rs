//! # Configuration System
//!
//! Typed configuration for the orchestration core, layered from an optional
//! YAML file and `RECRUITOPS__`-prefixed environment variables. All values
//! carry explicit serde defaults so an empty environment still yields a
//! runnable configuration; numeric knobs that would be unsafe at zero or
//! below are clamped with a logged warning rather than trusted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use recruitops_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?;
//! let pool_size = config.database.max_connections;
//! let bound = config.orchestration.effective_max_concurrent_items();
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default bound on concurrently executing items within one process
pub const DEFAULT_MAX_CONCURRENT_ITEMS: usize = 5;

/// Environment variable naming the YAML config file, if any
const CONFIG_PATH_ENV: &str = "RECRUITOPS_CONFIG_PATH";

/// Top-level configuration for the orchestration core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecruitOpsConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseConfig::default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    fn default_url() -> String {
        "postgresql://localhost/recruitops_development".to_string()
    }

    fn default_max_connections() -> u32 {
        10
    }

    fn default_acquire_timeout_seconds() -> u64 {
        30
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_seconds: Self::default_acquire_timeout_seconds(),
        }
    }
}

/// Orchestration engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Maximum items executing concurrently within one job run. Values at or
    /// below zero fall back to [`DEFAULT_MAX_CONCURRENT_ITEMS`].
    #[serde(default = "OrchestrationConfig::default_max_concurrent_items")]
    pub max_concurrent_items: i64,
    /// Cap on `recent_items` returned by the status read path
    #[serde(default = "OrchestrationConfig::default_recent_items_limit")]
    pub recent_items_limit: i64,
}

impl OrchestrationConfig {
    fn default_max_concurrent_items() -> i64 {
        DEFAULT_MAX_CONCURRENT_ITEMS as i64
    }

    fn default_recent_items_limit() -> i64 {
        5
    }

    /// Configured concurrency bound, clamped to a safe positive value
    pub fn effective_max_concurrent_items(&self) -> usize {
        if self.max_concurrent_items <= 0 {
            warn!(
                configured = self.max_concurrent_items,
                fallback = DEFAULT_MAX_CONCURRENT_ITEMS,
                "Non-positive max_concurrent_items configured, using default"
            );
            DEFAULT_MAX_CONCURRENT_ITEMS
        } else {
            self.max_concurrent_items as usize
        }
    }

    /// Configured recent-items cap, clamped to a safe positive value
    pub fn effective_recent_items_limit(&self) -> i64 {
        if self.recent_items_limit <= 0 {
            Self::default_recent_items_limit()
        } else {
            self.recent_items_limit
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: Self::default_max_concurrent_items(),
            recent_items_limit: Self::default_recent_items_limit(),
        }
    }
}

/// Distributed queue settings (pgmq)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Whether the queue adapter should be constructed at all. The engine is
    /// fully functional without it; the queue exists purely for scale.
    #[serde(default = "QueueConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "QueueConfig::default_queue_name")]
    pub queue_name: String,
    #[serde(default = "QueueConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Messages read per poll
    #[serde(default = "QueueConfig::default_batch_size")]
    pub batch_size: i32,
    /// Seconds a read message stays invisible before re-delivery
    #[serde(default = "QueueConfig::default_visibility_timeout_seconds")]
    pub visibility_timeout_seconds: i32,
}

impl QueueConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_queue_name() -> String {
        "bulk_action_jobs".to_string()
    }

    fn default_poll_interval_ms() -> u64 {
        500
    }

    fn default_batch_size() -> i32 {
        5
    }

    fn default_visibility_timeout_seconds() -> i32 {
        300
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            queue_name: Self::default_queue_name(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            batch_size: Self::default_batch_size(),
            visibility_timeout_seconds: Self::default_visibility_timeout_seconds(),
        }
    }
}

/// Generative message service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "GenerationConfig::default_model")]
    pub model: String,
    /// Upper bound on a single generation call; a slow external service must
    /// not occupy a concurrency slot indefinitely
    #[serde(default = "GenerationConfig::default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "GenerationConfig::default_max_tokens")]
    pub max_tokens: u32,
}

impl GenerationConfig {
    fn default_base_url() -> String {
        "http://localhost:8091".to_string()
    }

    fn default_model() -> String {
        "outreach-small".to_string()
    }

    fn default_timeout_seconds() -> u64 {
        15
    }

    fn default_max_tokens() -> u32 {
        512
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            model: Self::default_model(),
            timeout_seconds: Self::default_timeout_seconds(),
            max_tokens: Self::default_max_tokens(),
        }
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Loads [`RecruitOpsConfig`] from file and environment layers
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration.
    ///
    /// Layering, lowest precedence first: serde defaults, then the YAML file
    /// named by `RECRUITOPS_CONFIG_PATH` (optional), then environment
    /// variables such as `RECRUITOPS__DATABASE__URL`.
    pub fn load() -> Result<RecruitOpsConfig, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("RECRUITOPS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: RecruitOpsConfig = settings.try_deserialize()?;
        Ok(config)
    }
}
