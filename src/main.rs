//! Sentinel Response
//!
//! Loads the process-wide configuration, configures logging from its
//! `[log]` section and keeps it current until Ctrl+C.
//!
//! ```text
//!   config.toml ──▶ config::instance ──▶ observability::init_logging
//!        ▲                 │
//!        │                 ▼
//!   SIGHUP / watcher ──▶ reload (atomic swap, same instance)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};

use sentinel_response::config::{self, ConfigWatcher};
use sentinel_response::lifecycle::{bootstrap, signals, Shutdown};

#[derive(Parser)]
#[command(name = "sentinel-response")]
#[command(about = "Security incident response configuration service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loaded configuration sections
    Show {
        /// Print as pretty JSON
        #[arg(long)]
        json: bool,
    },
    /// Run with logging configured, reloading on SIGHUP until Ctrl+C
    Run {
        /// Also reload whenever the configuration file changes
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { watch: false }) {
        Commands::Show { json } => {
            let config = config::instance(cli.config.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*config.sections())?);
            } else {
                println!("{}", config);
            }
            Ok(())
        }
        Commands::Run { watch } => run(cli.config, watch).await,
    }
}

async fn run(path: Option<PathBuf>, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = bootstrap(path.as_deref())?;
    let config = Arc::clone(&runtime.config);

    tracing::info!(config = %config, "sentinel-response started");

    let shutdown = Shutdown::new();
    let reload_loop = tokio::spawn(signals::run_reload_loop(
        Arc::clone(&config),
        shutdown.subscribe(),
    ));

    let _watcher = if watch {
        let (watcher, mut updates) = ConfigWatcher::new(Arc::clone(&config));
        let handle = watcher.run()?;
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    update = updates.recv() => match update {
                        Some(generation) => tracing::info!(generation, "Configuration updated from disk"),
                        None => break,
                    },
                }
            }
        });
        Some(handle)
    } else {
        None
    };

    signals::wait_for_ctrl_c().await?;
    shutdown.trigger();
    reload_loop.await??;

    tracing::info!("Shutdown complete");
    drop(runtime);
    Ok(())
}
