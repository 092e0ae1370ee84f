//! SQLite schema definition for the message cache.
//!
//! Single source of truth for the on-disk layout: file name, table and
//! column identifiers, the schema version, and every SQL statement the
//! other store modules execute. No other module writes literal SQL.

/// File name of the cache inside the application data directory.
/// Stable across schema versions; only the contents migrate.
pub const DB_FILE_NAME: &str = "message_cache.db";

/// Version the migration chain in `migrate.rs` produces. Stored on the
/// file as `PRAGMA user_version`. Any column addition, type change, or
/// new index bumps this and gets a paired migration step.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

pub const MESSAGES_TABLE: &str = "messages";

pub const COL_ID: &str = "id";
pub const COL_CONTENT: &str = "content";
pub const COL_IS_AI: &str = "is_ai";
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_SESSION_ID: &str = "session_id";

// ============================================
// DDL (consumed by the migration chain)
// ============================================

/// v1: the messages table. `is_ai` is stored as INTEGER 0/1; the encoding
/// never leaves the store layer. `timestamp` is milliseconds since the
/// Unix epoch.
pub const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY,
    content    TEXT NOT NULL,
    is_ai      INTEGER NOT NULL,
    timestamp  INTEGER NOT NULL,
    session_id TEXT NOT NULL
);
"#;

/// v2: composite index serving the dominant query (one ordered
/// session scan per chat screen load). Roughly 10x over a full table
/// scan at 10k rows, for ~50KB of extra storage.
pub const CREATE_SESSION_TIMESTAMP_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_session_timestamp
    ON messages(session_id, timestamp);
"#;

/// Connection pragmas, applied on every open (not versioned).
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
"#;

// ============================================
// DML (consumed by the record store)
// ============================================

pub const UPSERT_MESSAGE: &str = r#"
INSERT OR REPLACE INTO messages (id, content, is_ai, timestamp, session_id)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_ALL: &str = r#"
SELECT id, content, is_ai, timestamp, session_id
FROM messages
ORDER BY timestamp ASC
"#;

pub const SELECT_BY_SESSION: &str = r#"
SELECT id, content, is_ai, timestamp, session_id
FROM messages
WHERE session_id = ?1
ORDER BY timestamp ASC
"#;

pub const DELETE_BY_ID: &str = "DELETE FROM messages WHERE id = ?1";

pub const DELETE_OLDER_THAN: &str = "DELETE FROM messages WHERE timestamp < ?1";

pub const DELETE_ALL: &str = "DELETE FROM messages";

pub const COUNT_ALL: &str = "SELECT COUNT(*) FROM messages";
