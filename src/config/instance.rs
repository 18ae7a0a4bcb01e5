//! The process-wide configuration instance.
//!
//! # Lifecycle
//! ```text
//! instance(path) ──▶ fast check: installed? ──yes──▶ return shared Arc
//!                         │ no
//!                         ▼
//!                   lock ─▶ re-check ─▶ load file ─▶ install ─▶ return
//!
//! reload(path)   ──▶ lock ─▶ load into snapshot ─▶ swap on success
//! ```
//!
//! The first successful caller decides the source path; later callers get
//! the same instance whatever path they pass. A failed first load installs
//! nothing, so a later call may retry. A failed reload leaves both the
//! current sections and the recorded path untouched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, RwLock};
use toml::Table;
use crate::config::loader::{load_sections, ConfigError};
use crate::config::schema::Sections;

/// File used when no path is given and the environment does not name one.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_PATH_ENV: &str = "SENTINEL_RESPONSE_CONFIG";

/// Resolve the default configuration path.
pub fn default_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

// An empty path counts as "not given".
fn requested(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Shared configuration: three sections plus the file they came from.
///
/// Readers never block. Each accessor loads the current snapshot, so a
/// reload becomes visible to every holder of the `Arc` at once.
#[derive(Debug)]
pub struct SentinelConfig {
    sections: ArcSwap<Sections>,
    source_path: RwLock<PathBuf>,
    generation: AtomicU64,
    /// Serialises reloads; shared with the owning slot's construction lock.
    write_lock: Arc<Mutex<()>>,
}

impl SentinelConfig {
    /// Load a standalone instance that is not registered in any slot.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(path.as_ref().to_path_buf(), Arc::new(Mutex::new(())))
    }

    fn load(path: PathBuf, write_lock: Arc<Mutex<()>>) -> Result<Self, ConfigError> {
        let sections = load_sections(&path)?;
        tracing::info!(path = %path.display(), "Configuration loaded");

        Ok(Self {
            sections: ArcSwap::from_pointee(sections),
            source_path: RwLock::new(path),
            generation: AtomicU64::new(1),
            write_lock,
        })
    }

    /// Current `[main]` section.
    pub fn main(&self) -> Table {
        self.sections.load().main.clone()
    }

    /// Current `[notification]` section.
    pub fn notification(&self) -> Table {
        self.sections.load().notification.clone()
    }

    /// Current `[log]` section.
    pub fn log(&self) -> Table {
        self.sections.load().log.clone()
    }

    /// Consistent snapshot of all three sections.
    pub fn sections(&self) -> Arc<Sections> {
        self.sections.load_full()
    }

    /// Path of the most recent successful load.
    pub fn source_path(&self) -> PathBuf {
        self.source_path.read().clone()
    }

    /// Number of successful loads into this instance (1 after construction).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Re-read the sections from `path`, or from the last source path.
    ///
    /// The new values are published only if the whole file loads; on error
    /// the previous sections and source path stay in place. Returns the new
    /// generation.
    pub fn reload(&self, path: Option<&Path>) -> Result<u64, ConfigError> {
        let _guard = self.write_lock.lock();

        let target = match requested(path) {
            Some(p) => p.to_path_buf(),
            None => self.source_path(),
        };

        let sections = match load_sections(&target) {
            Ok(sections) => sections,
            Err(e) => {
                tracing::warn!(
                    path = %target.display(),
                    error = %e,
                    "Configuration reload failed, keeping current values"
                );
                return Err(e);
            }
        };

        self.sections.store(Arc::new(sections));
        *self.source_path.write() = target;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::info!(
            path = %self.source_path().display(),
            generation,
            "Configuration reloaded"
        );
        Ok(generation)
    }
}

impl fmt::Display for SentinelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = self.sections.load();
        write!(f, "SentinelConfig({})", **sections)
    }
}

/// A holder for at most one [`SentinelConfig`].
///
/// Creation uses double-checked locking: an unguarded read answers every
/// call once an instance exists, and only callers that find the slot empty
/// contend for the lock. The winner loads the file; the rest re-check under
/// the lock and return the winner's instance.
#[derive(Debug, Default)]
pub struct ConfigSlot {
    instance: ArcSwapOption<SentinelConfig>,
    lock: Arc<Mutex<()>>,
    loads: AtomicU64,
}

impl ConfigSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed instance, if any, without loading.
    pub fn get(&self) -> Option<Arc<SentinelConfig>> {
        self.instance.load_full()
    }

    /// Construction loads this slot has attempted, failed ones included.
    ///
    /// Reloads of an installed instance are not counted; see
    /// [`SentinelConfig::generation`].
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Acquire)
    }

    /// Return the installed instance, loading it from `path` (or the
    /// default path) if the slot is empty.
    ///
    /// `path` is ignored once an instance exists.
    pub fn get_or_load(&self, path: Option<&Path>) -> Result<Arc<SentinelConfig>, ConfigError> {
        if let Some(existing) = self.instance.load_full() {
            return Ok(existing);
        }

        let _guard = self.lock.lock();
        if let Some(existing) = self.instance.load_full() {
            return Ok(existing);
        }

        let path = requested(path)
            .map(Path::to_path_buf)
            .unwrap_or_else(default_path);
        self.loads.fetch_add(1, Ordering::AcqRel);
        let config = Arc::new(SentinelConfig::load(path, Arc::clone(&self.lock))?);
        self.instance.store(Some(Arc::clone(&config)));

        Ok(config)
    }

    /// Empty the slot, returning whatever was installed.
    ///
    /// Existing holders keep a working instance; the next
    /// [`get_or_load`](Self::get_or_load) builds a fresh one.
    pub fn clear(&self) -> Option<Arc<SentinelConfig>> {
        let _guard = self.lock.lock();
        self.instance.swap(None)
    }
}

static GLOBAL: LazyLock<ConfigSlot> = LazyLock::new(ConfigSlot::new);

/// Get the process-wide configuration, loading it on first use.
pub fn instance(path: Option<&Path>) -> Result<Arc<SentinelConfig>, ConfigError> {
    GLOBAL.get_or_load(path)
}

/// Construction loads attempted by the process-wide slot so far.
pub fn load_count() -> u64 {
    GLOBAL.loads()
}

/// The process-wide configuration, if it has been loaded.
pub fn try_current() -> Option<Arc<SentinelConfig>> {
    GLOBAL.get()
}

/// Drop the process-wide instance so the next [`instance`] call loads again.
///
/// For test isolation only. Production code never needs to reset.
#[doc(hidden)]
pub fn reset_for_tests() {
    GLOBAL.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Barrier;

    // Tests touching GLOBAL or the environment run one at a time.
    static GLOBAL_TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

    const BASE: &str = r#"
[main]
foo = "bar"

[notification]
email = "user@example.com"

[log]
level = "DEBUG"
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_first_caller_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(dir.path(), "a.toml", BASE);
        let second = write(dir.path(), "b.toml", "[main]\nfoo = \"other\"\n");

        let slot = ConfigSlot::new();
        let a = slot.get_or_load(Some(first.as_path())).unwrap();
        let b = slot.get_or_load(Some(second.as_path())).unwrap();
        let c = slot.get_or_load(None).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(b.source_path(), first);
        assert_eq!(b.main()["foo"].as_str(), Some("bar"));
    }

    #[test]
    fn test_racing_callers_share_a_single_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);
        let slot = ConfigSlot::new();
        let threads = 24;
        let barrier = Barrier::new(threads);

        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    barrier.wait();
                    slot.get_or_load(Some(path.as_path())).unwrap();
                });
            }
        });

        assert_eq!(slot.loads(), 1);
        // Later calls take the fast path and never load again.
        slot.get_or_load(None).unwrap();
        assert_eq!(slot.loads(), 1);
    }

    #[test]
    fn test_failed_construction_counts_as_a_load() {
        let dir = tempfile::tempdir().unwrap();
        let slot = ConfigSlot::new();

        assert!(slot.get_or_load(Some(dir.path().join("missing.toml").as_path())).is_err());
        assert_eq!(slot.loads(), 1);
        assert!(slot.get().is_none());

        let path = write(dir.path(), "config.toml", BASE);
        slot.get_or_load(Some(path.as_path())).unwrap();
        assert_eq!(slot.loads(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);
        let config = SentinelConfig::open(&path).unwrap();

        let err = config.reload(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(config.source_path(), path);
        assert_eq!(config.log()["level"].as_str(), Some("DEBUG"));
        assert_eq!(config.generation(), 1);
    }

    #[test]
    fn test_failed_reload_on_parse_error_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);
        let config = SentinelConfig::open(&path).unwrap();

        fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(config.reload(None), Err(ConfigError::Parse { .. })));
        assert_eq!(config.main()["foo"].as_str(), Some("bar"));
    }

    #[test]
    fn test_empty_path_means_previous_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);
        let config = SentinelConfig::open(&path).unwrap();

        fs::write(&path, "[main]\nfoo = \"baz\"\n").unwrap();
        assert_eq!(config.reload(Some(Path::new(""))).unwrap(), 2);
        assert_eq!(config.main()["foo"].as_str(), Some("baz"));
        assert!(config.notification().is_empty());
    }

    #[test]
    fn test_clear_keeps_old_holders_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);

        let slot = ConfigSlot::new();
        let old = slot.get_or_load(Some(path.as_path())).unwrap();
        assert!(slot.clear().is_some());
        assert!(slot.get().is_none());

        let fresh = slot.get_or_load(Some(path.as_path())).unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(old.main(), fresh.main());
    }

    #[test]
    fn test_concurrent_reloads_are_serialised() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);
        let config = SentinelConfig::open(&path).unwrap();
        let threads = 8;
        let barrier = Barrier::new(threads);

        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    barrier.wait();
                    config.reload(None).unwrap();
                });
            }
        });

        assert_eq!(config.generation(), 1 + threads as u64);
    }

    #[test]
    fn test_display_lists_sections() {
        let dir = tempfile::tempdir().unwrap();
        let config = SentinelConfig::open(write(dir.path(), "c.toml", BASE)).unwrap();
        let rendered = config.to_string();
        assert!(rendered.starts_with("SentinelConfig("));
        assert!(rendered.contains("user@example.com"));
    }

    #[test]
    fn test_global_instance_and_reset() {
        let _serial = GLOBAL_TEST_LOCK.lock();
        reset_for_tests();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", BASE);

        assert!(try_current().is_none());
        assert!(instance(Some(dir.path().join("missing.toml").as_path())).is_err());
        assert!(try_current().is_none());

        let a = instance(Some(path.as_path())).unwrap();
        let b = instance(None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &try_current().unwrap()));

        reset_for_tests();
        assert!(try_current().is_none());
    }

    #[test]
    fn test_default_path_from_environment() {
        let _serial = GLOBAL_TEST_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "env.toml", BASE);

        std::env::set_var(CONFIG_PATH_ENV, &path);
        assert_eq!(default_path(), path);
        let slot = ConfigSlot::new();
        let config = slot.get_or_load(None).unwrap();
        assert_eq!(config.source_path(), path);

        std::env::set_var(CONFIG_PATH_ENV, "");
        assert_eq!(default_path(), PathBuf::from(DEFAULT_CONFIG_FILE));
        std::env::remove_var(CONFIG_PATH_ENV);
    }
}
