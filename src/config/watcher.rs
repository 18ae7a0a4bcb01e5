//! Configuration file watcher for hot reload.
//!
//! The watch follows the instance's source path: when an explicit
//! `reload(Some(other))` moves the configuration to another file, the next
//! event or tick drops the old watch and watches `other` instead.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::config::instance::SentinelConfig;

/// A watcher that reloads a [`SentinelConfig`] when its file changes.
pub struct ConfigWatcher {
    config: Arc<SentinelConfig>,
    update_tx: mpsc::UnboundedSender<u64>,
    poll_interval: Duration,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver that yields the generation of
    /// every successful reload.
    pub fn new(config: Arc<SentinelConfig>) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self {
            config,
            update_tx,
            poll_interval: Duration::from_secs(2),
        }, update_rx)
    }

    /// How often to check whether the source path moved (and, on platforms
    /// without native events, to poll the file).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start watching the instance's current source path.
    ///
    /// Must be called inside a Tokio runtime. The returned task runs until
    /// the update receiver is dropped.
    pub fn run(self) -> Result<JoinHandle<()>, notify::Error> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(self.poll_interval))?;

        let mut watched = self.config.source_path();
        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?watched, "Config watcher started");

        let ConfigWatcher { config, update_tx, poll_interval } = self;

        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    event = event_rx.recv() => {
                        if event.is_none() {
                            break;
                        }
                        tracing::info!("Config file change detected, reloading...");
                        let target = Arc::clone(&config);
                        match tokio::task::spawn_blocking(move || target.reload(None)).await {
                            Ok(Ok(generation)) => {
                                if update_tx.send(generation).is_err() {
                                    break;
                                }
                            }
                            Ok(Err(e)) => {
                                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                            }
                            Err(e) => tracing::error!(error = %e, "Config reload task failed"),
                        }
                    }
                    _ = ticker.tick() => {
                        if update_tx.is_closed() {
                            break;
                        }
                    }
                }

                follow_source(&mut watcher, &mut watched, config.source_path());
            }
            tracing::debug!("Config watcher stopped");
        }))
    }
}

/// Move the watch to `current` if the source path changed.
fn follow_source(watcher: &mut RecommendedWatcher, watched: &mut PathBuf, current: PathBuf) {
    if *watched == current {
        return;
    }

    if let Err(e) = watcher.unwatch(watched.as_path()) {
        tracing::debug!(path = ?watched, error = %e, "Unwatch failed");
    }
    match watcher.watch(&current, RecursiveMode::NonRecursive) {
        Ok(()) => tracing::info!(from = ?watched, to = ?current, "Config watcher moved"),
        Err(e) => tracing::error!(path = ?current, error = %e, "Failed to watch new config path"),
    }
    *watched = current;
}
