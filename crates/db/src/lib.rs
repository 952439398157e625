//! SQLite access layer for libris.
//!
//! A [`Database`] is a cheap, cloneable handle to the database file. Each
//! unit of work (one HTTP request, one migration run) opens its own scoped
//! [`rusqlite::Connection`] via [`Database::session`] and drops it on every
//! exit path. No pooling, no shared connection state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod migrate;

pub use error::DbError;
pub use migrate::{run_migrations, Migration};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a SQLite database file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and verify it is
    /// usable. Parent directories are created when missing.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let db = Self { path };
        let conn = db.session()?;
        let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        tracing::info!(path = %db.path.display(), %version, "sqlite database ready");
        Ok(db)
    }

    /// Open a connection scoped to one unit of work. The caller owns the
    /// connection; it closes when dropped.
    pub fn session(&self) -> Result<Connection, DbError> {
        let conn = Connection::open(&self.path).map_err(|source| DbError::Open {
            path: self.path.display().to_string(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("books.db");

        let db = Database::connect(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn sessions_share_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("books.db")).unwrap();

        let first = db.session().unwrap();
        first
            .execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('x');")
            .unwrap();
        drop(first);

        let second = db.session().unwrap();
        let v: String = second
            .query_row("SELECT v FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, "x");
    }
}
