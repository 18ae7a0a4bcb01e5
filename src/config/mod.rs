//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML: [main], [notification], [log])
//!     → loader.rs (existence check, parse)
//!     → Sections snapshot (missing sections are empty tables)
//!     → instance.rs (one SentinelConfig per process, shared via Arc)
//!
//! On reload (explicit call, SIGHUP or watcher.rs):
//!     → loader.rs loads a fresh snapshot
//!     → atomic swap of Arc<Sections> on success
//!     → every holder observes the new sections
//! ```
//!
//! # Design Decisions
//! - Sections stay untyped tables; consumers derive typed views (see `LogSettings`)
//! - A failed load or reload never publishes partial state

pub mod instance;
pub mod loader;
pub mod schema;
pub mod watcher;

pub use instance::{default_path, instance, load_count, reset_for_tests, try_current, ConfigSlot, SentinelConfig};
pub use loader::ConfigError;
pub use schema::{LogRotation, LogSettings, Sections};
pub use watcher::ConfigWatcher;
