//! Module-contributed schema migrations.
//!
//! Modules declare their DDL as [`Migration`] values; the application
//! collects them and hands the ordered list to [`run_migrations`]. Applied
//! migrations are recorded in a `schema_migrations` table keyed by
//! `(module, id)` so reruns are no-ops.

use rusqlite::{params, Connection};

use crate::DbError;

/// A single migration step contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const LEDGER_DDL: &str = "\
CREATE TABLE IF NOT EXISTS schema_migrations (
    module     TEXT NOT NULL,
    id         TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (module, id)
);";

/// Apply every not-yet-applied migration in the order given.
pub fn run_migrations(
    conn: &Connection,
    migrations: &[(String, Migration)],
) -> Result<(), DbError> {
    conn.execute_batch(LEDGER_DDL)?;

    for (module, migration) in migrations {
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE module = ?1 AND id = ?2)",
            params![module, migration.id],
            |row| row.get(0),
        )?;
        if applied {
            tracing::debug!(module = %module, id = migration.id, "migration already applied");
            continue;
        }

        conn.execute_batch(migration.up)
            .map_err(|source| DbError::Migration {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            })?;
        conn.execute(
            "INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)",
            params![module, migration.id],
        )?;
        tracing::info!(module = %module, id = migration.id, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(String, Migration)> {
        vec![(
            "books".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT NOT NULL);",
            },
        )]
    }

    #[test]
    fn applies_pending_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &sample()).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(recorded, 1);
    }

    #[test]
    fn rerun_is_a_noop() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &sample()).unwrap();
        // A second run must skip the already-applied step instead of failing
        // on the duplicate CREATE TABLE.
        run_migrations(&conn, &sample()).unwrap();
    }

    #[test]
    fn failed_migration_reports_module_and_id() {
        let conn = Connection::open_in_memory().unwrap();
        let broken = vec![(
            "books".to_string(),
            Migration {
                id: "002_broken",
                up: "THIS IS NOT SQL;",
            },
        )];

        let err = run_migrations(&conn, &broken).unwrap_err();
        match err {
            DbError::Migration { module, id, .. } => {
                assert_eq!(module, "books");
                assert_eq!(id, "002_broken");
            }
            other => panic!("expected migration error, got {other:?}"),
        }
    }
}
