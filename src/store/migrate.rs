//! Ordered schema migrations.
//!
//! Each step is tagged with the version it produces and runs in its own
//! transaction that also bumps `PRAGMA user_version`, so a failed step
//! leaves the file at the last version that fully applied. Steps are
//! additive only: add columns with defaults or add indexes, never drop
//! or rewrite columns existing rows depend on.

use rusqlite::Connection;
use tracing::info;

use crate::error::CacheError;
use crate::store::schema;

pub(crate) struct Migration {
    pub version: i64,
    pub sql: &'static str,
}

/// The full chain, ascending. A fresh file (user_version 0) runs all of
/// it; an existing file runs only the steps past its stored version.
pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: schema::CREATE_MESSAGES_TABLE,
    },
    Migration {
        version: 2,
        sql: schema::CREATE_SESSION_TIMESTAMP_INDEX,
    },
];

/// Bring `conn` from its stored version up to
/// [`schema::CURRENT_SCHEMA_VERSION`]. Idempotent: a file already at the
/// current version applies nothing.
pub(crate) fn run(conn: &mut Connection) -> Result<(), CacheError> {
    let on_disk: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(CacheError::init)?;

    for step in MIGRATIONS
        .iter()
        .filter(|m| m.version > on_disk && m.version <= schema::CURRENT_SCHEMA_VERSION)
    {
        apply_step(conn, step).map_err(|e| {
            CacheError::Initialization(format!(
                "migration to schema v{} failed: {e}",
                step.version
            ))
        })?;
        info!(version = step.version, "applied schema migration");
    }

    Ok(())
}

fn apply_step(conn: &mut Connection, step: &Migration) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::CURRENT_SCHEMA_VERSION;

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    fn index_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn chain_is_ascending_and_ends_at_current() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert_eq!(*versions.last().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn fresh_file_runs_full_chain() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();

        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);
        assert!(index_exists(&conn, "idx_messages_session_timestamp"));
    }

    #[test]
    fn partial_upgrade_applies_only_pending_steps() {
        let mut conn = Connection::open_in_memory().unwrap();

        // Simulate a v1 file: table only, no index.
        conn.execute_batch(schema::CREATE_MESSAGES_TABLE).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        assert!(!index_exists(&conn, "idx_messages_session_timestamp"));

        run(&mut conn).unwrap();
        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);
        assert!(index_exists(&conn, "idx_messages_session_timestamp"));
    }

    #[test]
    fn rerun_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap();
        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn upgrade_preserves_existing_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_MESSAGES_TABLE).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn.execute(
            "INSERT INTO messages (id, content, is_ai, timestamp, session_id)
             VALUES ('m1', 'hi', 0, 1000, 's1')",
            [],
        )
        .unwrap();

        run(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn failed_step_keeps_last_applied_version() {
        let mut conn = Connection::open_in_memory().unwrap();

        // A v1 file missing its table: the index step cannot apply.
        conn.pragma_update(None, "user_version", 1).unwrap();

        let err = run(&mut conn).unwrap_err();
        assert!(matches!(err, CacheError::Initialization(_)));
        assert_eq!(user_version(&conn), 1);
    }
}
