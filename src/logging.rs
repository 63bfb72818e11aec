//! Logging bootstrap
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over the
//! configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or filter directive, e.g. `info` or `embed_core=debug`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Install the global subscriber
///
/// Fails if the filter is invalid, the format is unknown, or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {}", config.level, e))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true))
            .try_init()?,
        "pretty" => registry
            .with(fmt::layer().pretty().with_target(true))
            .try_init()?,
        other => anyhow::bail!("Unknown log format: {}", other),
    }

    Ok(())
}
