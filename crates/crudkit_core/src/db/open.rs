//! Connection bootstrap for SQLite working contexts.
//!
//! # Responsibility
//! - Open one connection to the configured store.
//! - Apply the per-connection pragmas every context relies on.
//!
//! # Invariants
//! - The busy timeout is installed before any pragma that may need a lock.
//! - A connection that fails bootstrap is dropped, never handed out.
//! - Memory stores live on the `memdb` VFS, so lock conflicts wait out the
//!   busy timeout exactly like file stores.

use crate::config::{StoreConfig, StoreLocation};
use crate::error::StoreResult;
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::time::Instant;

/// Resolved address of a store: a file path or a `memdb` VFS URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreTarget {
    address: String,
    memory: bool,
}

impl StoreTarget {
    /// Resolves `config.location`, using `memory_name` for memory stores.
    pub(crate) fn resolve(config: &StoreConfig, memory_name: &str) -> Self {
        match &config.location {
            StoreLocation::File { path } => Self {
                address: path.to_string_lossy().into_owned(),
                memory: false,
            },
            StoreLocation::Memory { .. } => Self {
                address: format!("file:/{memory_name}?vfs=memdb"),
                memory: true,
            },
        }
    }

    pub(crate) fn mode(&self) -> &'static str {
        if self.memory {
            "memory"
        } else {
            "file"
        }
    }
}

/// Opens and bootstraps one connection.
///
/// # Side effects
/// - Emits `db_open` events with duration and status.
pub(crate) fn open_connection(target: &StoreTarget, config: &StoreConfig) -> StoreResult<Connection> {
    let started_at = Instant::now();
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let conn = Connection::open_with_flags(&target.address, flags)
        .and_then(|conn| bootstrap_connection(&conn, target, config).map(|()| conn));

    match conn {
        Ok(conn) => {
            debug!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                target.mode(),
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                target.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn bootstrap_connection(
    conn: &Connection,
    target: &StoreTarget,
    config: &StoreConfig,
) -> rusqlite::Result<()> {
    conn.busy_timeout(config.busy_timeout_duration())?;
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    conn.pragma_update(None, "case_sensitive_like", config.case_sensitive_like)?;
    if !target.memory {
        let _mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_pragma(),
            |row| row.get(0),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{open_connection, StoreTarget};
    use crate::config::StoreConfig;

    #[test]
    fn memory_target_uses_named_memdb_uri() {
        let target = StoreTarget::resolve(&StoreConfig::in_memory(), "unit");
        assert_eq!(target.address, "file:/unit?vfs=memdb");
        assert_eq!(target.mode(), "memory");
    }

    #[test]
    fn file_connection_gets_configured_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file(dir.path().join("open.db"));
        let target = StoreTarget::resolve(&config, "unused");

        let conn = open_connection(&target, &config).unwrap();
        let foreign_keys: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .unwrap();

        assert_eq!(foreign_keys, 1);
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }

    #[test]
    fn unreachable_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file(dir.path().join("missing").join("store.db"));
        let target = StoreTarget::resolve(&config, "unused");
        assert!(open_connection(&target, &config).is_err());
    }
}
