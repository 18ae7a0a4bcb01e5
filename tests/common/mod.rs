//! Shared fixtures for configuration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;

/// Tests touching the process-wide instance must hold this.
pub static GLOBAL: Mutex<()> = parking_lot::const_mutex(());

pub const BASE_CONFIG: &str = r#"
[main]
foo = "bar"

[notification]
email = "user@example.com"

[log]
level = "DEBUG"
"#;

pub const UPDATED_CONFIG: &str = r#"
[main]
foo = "baz"

[notification]
email = "another@example.com"

[log]
level = "INFO"
"#;

/// Write `content` to `<dir>/config.toml`.
pub fn write_toml(dir: &Path, content: &str) -> PathBuf {
    write_named(dir, "config.toml", content)
}

pub fn write_named(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Read a string key out of a section.
pub fn str_of<'a>(table: &'a toml::Table, key: &str) -> Option<&'a str> {
    table.get(key).and_then(|v| v.as_str())
}
