//! `tracing` subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a global subscriber was already installed.
pub fn init_tracing(cfg: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("yr_forecast={}", cfg.level)));

    let installed = if cfg.format == "json" {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    };

    match installed {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("tracing subscriber already installed: {}", e);
            false
        }
    }
}
