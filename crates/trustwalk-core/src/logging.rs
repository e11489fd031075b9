//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Installs a global fmt subscriber filtered by `RUST_LOG`, or by
/// `config.level` when `RUST_LOG` is unset.
///
/// Returns false if a global subscriber was already installed; the
/// existing one stays in place.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(directives))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_thread_names(config.thread_names),
        )
        .try_init()
        .is_ok()
}
