//! # Structured Logging
//!
//! Tracing initialization for worker binaries and embedding processes.
//! Library code only emits `tracing` events; the process entry point decides
//! how they are rendered. Initialization is idempotent so tests and embedded
//! callers can call it freely.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging.
///
/// The filter comes from `RUST_LOG` when set, falling back to `info`.
/// Setting `RECRUITOPS_LOG_FORMAT=json` switches to JSON lines for
/// log-aggregated deployments; the default is the human-readable formatter.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json = std::env::var("RECRUITOPS_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_safe() {
        init_logging();
        init_logging();
    }
}
