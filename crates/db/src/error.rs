//! Error taxonomy for the storage layer.
//!
//! Unique-constraint violations get their own variant so callers can treat
//! them as the authoritative duplicate signal (e.g. a second book with an
//! already-stored ISBN) instead of running a racy pre-check query. Every
//! other storage failure propagates unmodified; this layer does no retry
//! and no recovery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("migration {module}/{id} failed: {source}")]
    Migration {
        module: String,
        id: String,
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        // Only unique-index violations get the dedicated variant; other
        // constraint failures (NOT NULL, CHECK) stay generic storage errors.
        if let rusqlite::Error::SqliteFailure(e, ref msg) = err {
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                return DbError::UniqueViolation(detail);
            }
        }
        DbError::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn constraint_violation_maps_to_unique_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT); CREATE UNIQUE INDEX t_v ON t (v);")
            .unwrap();
        conn.execute("INSERT INTO t VALUES ('dup')", []).unwrap();

        let err: DbError = conn
            .execute("INSERT INTO t VALUES ('dup')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[test]
    fn not_null_violation_stays_a_generic_storage_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);")
            .unwrap();

        let err: DbError = conn
            .execute("INSERT INTO t (v) VALUES (NULL)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[test]
    fn other_failures_pass_through() {
        let conn = Connection::open_in_memory().unwrap();
        let err: DbError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();
        assert!(matches!(err, DbError::Sqlite(_)));
    }
}
