//! Store connection settings.
//!
//! # Responsibility
//! - Describe where the store lives and how each working context is tuned.
//! - Stay a plain value: loading it from files or environment is the caller's job.
//!
//! # Invariants
//! - Defaults produce a usable private in-memory store.
//! - Equal configs describe the same store; the global factory relies on this.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Physical location of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLocation {
    /// Database file on disk.
    File { path: PathBuf },
    /// Named in-memory database on the `memdb` VFS, shared by every
    /// connection in the process using the name. A missing name is
    /// generated when the factory is built.
    Memory { name: Option<String> },
}

/// SQLite journal mode applied to file-backed stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub(crate) fn as_pragma(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Lock acquisition strategy for `BEGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeginMode {
    Deferred,
    Immediate,
    Exclusive,
}

impl BeginMode {
    pub(crate) fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED;",
            Self::Immediate => "BEGIN IMMEDIATE;",
            Self::Exclusive => "BEGIN EXCLUSIVE;",
        }
    }
}

/// Settings shared by every working context a factory hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a context waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
    /// Keeps `LIKE` case-sensitive so it differs from `like_insensitive`.
    pub case_sensitive_like: bool,
    pub journal_mode: JournalMode,
    pub begin_mode: BeginMode,
}

impl StoreConfig {
    /// Config for a database file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File { path: path.into() },
            ..Self::default()
        }
    }

    /// Config for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Config for a named in-memory database, shared by every factory built
    /// with the same name in this process.
    pub fn named_memory(name: impl Into<String>) -> Self {
        Self {
            location: StoreLocation::Memory {
                name: Some(name.into()),
            },
            ..Self::default()
        }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn case_sensitive_like(mut self, enabled: bool) -> Self {
        self.case_sensitive_like = enabled;
        self
    }

    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn begin_mode(mut self, mode: BeginMode) -> Self {
        self.begin_mode = mode;
        self
    }

    pub fn busy_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.location, StoreLocation::Memory { .. })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory { name: None },
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            case_sensitive_like: true,
            journal_mode: JournalMode::Wal,
            begin_mode: BeginMode::Immediate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BeginMode, JournalMode, StoreConfig, StoreLocation};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn builder_overrides_defaults() {
        let config = StoreConfig::file("/tmp/crudkit.db")
            .busy_timeout(Duration::from_secs(2))
            .begin_mode(BeginMode::Deferred)
            .journal_mode(JournalMode::Delete)
            .foreign_keys(false);

        assert_eq!(
            config.location,
            StoreLocation::File {
                path: PathBuf::from("/tmp/crudkit.db")
            }
        );
        assert_eq!(config.busy_timeout_ms, 2_000);
        assert_eq!(config.begin_mode, BeginMode::Deferred);
        assert_eq!(config.journal_mode, JournalMode::Delete);
        assert!(!config.foreign_keys);
        assert!(config.case_sensitive_like);
    }

    #[test]
    fn deserializes_partial_document_with_defaults() {
        let config: StoreConfig = serde_json::from_str(
            r#"{ "location": { "kind": "file", "path": "/var/lib/app.db" }, "begin_mode": "exclusive" }"#,
        )
        .expect("partial config should deserialize");

        assert_eq!(config.begin_mode, BeginMode::Exclusive);
        assert_eq!(config.busy_timeout_ms, StoreConfig::default().busy_timeout_ms);
        assert!(!config.is_memory());
    }

    #[test]
    fn default_is_private_memory_store() {
        let config = StoreConfig::default();
        assert_eq!(config.location, StoreLocation::Memory { name: None });
        assert_eq!(config.begin_mode, BeginMode::Immediate);
    }
}
