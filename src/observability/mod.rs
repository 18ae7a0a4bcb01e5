//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! [log] section (read once at startup)
//!     → logging.rs (filter, stderr layer, file layer)
//!
//! All subsystems produce:
//!     → tracing events with structured fields
//! ```

pub mod logging;

pub use logging::{init_logging, LoggingError, LoggingGuard};
