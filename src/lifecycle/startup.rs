//! Startup orchestration.
//!
//! Configuration comes first: a missing or unreadable file is fatal, and
//! nothing else is initialized. Logging is configured from the loaded
//! `[log]` section.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use crate::config::{self, ConfigError, SentinelConfig};
use crate::observability::{init_logging, LoggingError, LoggingGuard};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Everything a running process needs to hold on to.
pub struct Runtime {
    pub config: Arc<SentinelConfig>,
    pub logging: LoggingGuard,
}

/// Load the process-wide configuration and install logging from it.
pub fn bootstrap(path: Option<&Path>) -> Result<Runtime, StartupError> {
    let config = config::instance(path)?;
    let logging = init_logging(&config)?;

    tracing::info!(
        path = %config.source_path().display(),
        generation = config.generation(),
        "Configuration ready"
    );

    Ok(Runtime { config, logging })
}
