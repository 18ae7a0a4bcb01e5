//! Sentinel Response configuration core.
//!
//! One process-wide [`SentinelConfig`] holds the `[main]`, `[notification]`
//! and `[log]` sections of a TOML file. It is loaded once on first use and
//! can be reloaded in place by explicit call, SIGHUP or file watching.

pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigError, ConfigSlot, SentinelConfig};
pub use lifecycle::Shutdown;
