//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config (fail fast) → Initialize logging
//!
//! Signals (signals.rs):
//!     SIGHUP → reload configuration in place
//!     SIGINT (Ctrl+C) → trigger shutdown
//!
//! Shutdown (shutdown.rs):
//!     Broadcast to background loops → loops exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, Runtime, StartupError};
