//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the `[log]` section
//! - Human-readable output on stderr, plus a log file (plain or JSON lines)
//! - `RUST_LOG` overrides the configured level when set
//!
//! The configuration is read once at startup; a later reload does not
//! rebuild the subscriber.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use crate::config::{LogRotation, LogSettings, SentinelConfig};

/// Errors raised while installing the logging subsystem.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Keeps the background file writer alive. Drop it at exit to flush.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: WorkerGuard,
}

/// Level filter: `RUST_LOG` if set, else the configured level.
pub fn build_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter_directive()))
}

/// Open the rolling file appender described by `settings`, creating the
/// parent directory if needed.
pub fn file_appender(settings: &LogSettings) -> Result<RollingFileAppender, LoggingError> {
    let dir = settings
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let prefix = settings
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.log", settings.app_name));

    let rotation = match settings.rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Minutely => Rotation::MINUTELY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix);
    if settings.rotation != LogRotation::Never {
        builder = builder.max_log_files(settings.backup_count.max(1));
    }

    Ok(builder.build(dir)?)
}

/// Install the global subscriber configured from `config`'s `[log]` section.
pub fn init_logging(config: &SentinelConfig) -> Result<LoggingGuard, LoggingError> {
    let settings = LogSettings::from_sections(&config.sections());

    let (writer, guard) = tracing_appender::non_blocking(file_appender(&settings)?);
    let file_layer = if settings.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(build_filter(&settings))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    tracing::info!(
        app = %settings.app_name,
        level = settings.filter_directive(),
        file = %settings.file.display(),
        "Logging initialized"
    );

    Ok(LoggingGuard { _file: guard })
}
