//! OS signal handling.
//!
//! SIGHUP reloads the configuration in place; it never shuts the process
//! down. Ctrl+C is surfaced to the caller, which triggers shutdown.

use std::sync::Arc;
use tokio::sync::broadcast;
use crate::config::SentinelConfig;

/// Reload from the last source path, logging instead of failing.
///
/// Returns the new generation, or `None` if the reload was rejected.
pub fn reload_now(config: &SentinelConfig) -> Option<u64> {
    match config.reload(None) {
        Ok(generation) => Some(generation),
        Err(e) => {
            tracing::error!(error = %e, "Configuration reload failed, keeping current configuration");
            None
        }
    }
}

/// [`reload_now`] on the blocking pool, keeping file I/O off the runtime
/// workers.
pub async fn reload_in_background(config: Arc<SentinelConfig>) -> Option<u64> {
    match tokio::task::spawn_blocking(move || reload_now(&config)).await {
        Ok(generation) => generation,
        Err(e) => {
            tracing::error!(error = %e, "Configuration reload task failed");
            None
        }
    }
}

/// Reload `config` on every SIGHUP until shutdown is triggered.
///
/// On non-Unix platforms there is no hangup signal, so this only waits for
/// shutdown.
pub async fn run_reload_loop(
    config: Arc<SentinelConfig>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangup = signal(SignalKind::hangup())?;
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading configuration");
                    reload_in_background(Arc::clone(&config)).await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = config;
        let _ = shutdown.recv().await;
    }

    tracing::debug!("Reload loop stopped");
    Ok(())
}

/// Wait for Ctrl+C.
pub async fn wait_for_ctrl_c() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    Ok(())
}
