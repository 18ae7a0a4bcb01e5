//! Configuration schema definitions.
//!
//! The document is deliberately loose: each section is an arbitrary TOML
//! table and consumers pick out the keys they understand. Typed views such
//! as [`LogSettings`] are derived from a [`Sections`] snapshot on demand.

use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

/// One loaded snapshot of the three configuration sections.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Sections {
    /// Application-wide settings (`[main]`).
    pub main: Table,

    /// Notification channel settings (`[notification]`).
    pub notification: Table,

    /// Logging settings (`[log]`).
    pub log: Table,
}

impl fmt::Display for Sections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "main={}, notification={}, log={}",
            Value::Table(self.main.clone()),
            Value::Table(self.notification.clone()),
            Value::Table(self.log.clone()),
        )
    }
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRotation {
    #[default]
    Never,
    Daily,
    Hourly,
    Minutely,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "never" => Some(Self::Never),
            "daily" => Some(Self::Daily),
            "hourly" => Some(Self::Hourly),
            "minutely" => Some(Self::Minutely),
            _ => None,
        }
    }
}

/// Logging settings read from `main.app_name` and the `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Application name, used as the default log file stem.
    pub app_name: String,

    /// Level as written in the file (e.g. "DEBUG", "warning").
    pub level: String,

    /// Log file path.
    pub file: PathBuf,

    /// File rotation schedule.
    pub rotation: LogRotation,

    /// Rotated files to keep.
    pub backup_count: usize,

    /// Write the file layer as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            level: "INFO".to_string(),
            file: PathBuf::from(format!("{}.log", default_app_name())),
            rotation: LogRotation::Never,
            backup_count: 3,
            json: false,
        }
    }
}

fn default_app_name() -> String {
    "app".to_string()
}

/// Name for a numeric level (10 = DEBUG ... 50 = CRITICAL).
///
/// A threshold between two named levels rounds up to the next one, since
/// only records at or above the threshold pass.
fn numeric_level_name(level: i64) -> &'static str {
    match level {
        i64::MIN..=0 => "NOTSET",
        1..=10 => "DEBUG",
        11..=20 => "INFO",
        21..=30 => "WARNING",
        31..=40 => "ERROR",
        41..=50 => "CRITICAL",
        _ => "OFF",
    }
}

impl LogSettings {
    /// Derive settings from a snapshot, falling back to defaults for
    /// missing or ill-typed keys.
    pub fn from_sections(sections: &Sections) -> Self {
        let defaults = Self::default();
        let log = &sections.log;

        let app_name = sections
            .main
            .get("app_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.app_name);

        let file = log
            .get("file")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("{app_name}.log")));

        Self {
            level: log
                .get("level")
                .and_then(|value| match value {
                    Value::String(name) => Some(name.clone()),
                    Value::Integer(number) => Some(numeric_level_name(*number).to_string()),
                    _ => None,
                })
                .unwrap_or(defaults.level),
            file,
            rotation: log
                .get("rotation")
                .and_then(Value::as_str)
                .and_then(LogRotation::parse)
                .unwrap_or(defaults.rotation),
            backup_count: log
                .get("backup_count")
                .and_then(Value::as_integer)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.backup_count),
            json: log
                .get("json")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.json),
            app_name,
        }
    }

    /// Map the configured level onto a `tracing` filter directive.
    ///
    /// Accepts the usual aliases (`WARNING`, `CRITICAL`, `FATAL`, `NOTSET`);
    /// anything unrecognised becomes `info`.
    pub fn filter_directive(&self) -> &'static str {
        match self.level.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "NOTSET" => "trace",
            "DEBUG" => "debug",
            "INFO" => "info",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" | "FATAL" => "error",
            "OFF" => "off",
            _ => "info",
        }
    }
}
