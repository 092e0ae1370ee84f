//! Message storage with SQLite.
//!
//! `MessageStore` is the public face of the cache: an async CRUD API over
//! one `messages` table. Each operation acquires the shared handle (opening
//! the database lazily on first use) and runs its blocking rusqlite work on
//! a `spawn_blocking` thread, so event-loop callers never block on file I/O.
//!
//! Contract notes:
//! - `upsert` is insert-or-replace keyed by `id`; last write wins, no merge.
//! - Reads are snapshots ordered ascending by `timestamp`; per-session reads
//!   are served by the `(session_id, timestamp)` index.
//! - No operation retries or times out internally; `Locked` errors surface
//!   to the caller, who owns the retry policy.

pub(crate) mod conn;
pub(crate) mod migrate;
pub(crate) mod schema;

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::CacheError;
use self::conn::{ConnectionManager, DbHandle};

/// A cached chat message. The sole persisted entity; plain values only,
/// nothing engine-specific crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Caller-supplied unique id (UUID or backend-issued).
    pub id: String,
    /// Text body.
    pub content: String,
    /// True for assistant-authored messages, false for user-authored.
    pub is_ai: bool,
    /// Milliseconds since the Unix epoch; retrieval order key.
    pub timestamp: i64,
    /// Conversation grouping key; never empty.
    pub session_id: String,
}

pub struct MessageStore {
    manager: ConnectionManager,
}

impl MessageStore {
    /// Create a store backed by the configured database path. No I/O
    /// happens here; the file opens on the first operation.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        Ok(Self::at_path(config.database_path()?))
    }

    /// Create a store at an explicit path (tests, fixed host layouts).
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            manager: ConnectionManager::new(path),
        }
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &std::path::Path {
        self.manager.path()
    }

    // ============================================
    // WRITES
    // ============================================

    /// Insert the message, fully replacing any existing row with the same
    /// `id`. Idempotent: replaying the same upsert yields the same row.
    pub async fn upsert(&self, message: &Message) -> Result<(), CacheError> {
        if message.id.is_empty() {
            return Err(CacheError::Query("message id must not be empty".into()));
        }
        if message.session_id.is_empty() {
            return Err(CacheError::Query("session id must not be empty".into()));
        }

        let message = message.clone();
        self.with_conn(move |conn| {
            conn.execute(
                schema::UPSERT_MESSAGE,
                params![
                    message.id,
                    message.content,
                    message.is_ai,
                    message.timestamp,
                    message.session_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Remove a single message. Returns 1 if a row was removed, 0 if the
    /// id was absent (not an error).
    pub async fn delete_by_id(&self, id: &str) -> Result<u64, CacheError> {
        if id.is_empty() {
            return Err(CacheError::Query("message id must not be empty".into()));
        }

        let id = id.to_string();
        self.with_conn(move |conn| {
            let n = conn.execute(schema::DELETE_BY_ID, params![id])?;
            Ok(n as u64)
        })
        .await
    }

    /// Remove every message with `timestamp < cutoff_ms`. Rows at exactly
    /// the cutoff survive. Returns the number removed.
    pub async fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, CacheError> {
        if cutoff_ms < 0 {
            return Err(CacheError::Query(format!(
                "cutoff must be a non-negative epoch timestamp, got {cutoff_ms}"
            )));
        }

        let removed = self
            .with_conn(move |conn| {
                let n = conn.execute(schema::DELETE_OLDER_THAN, params![cutoff_ms])?;
                Ok(n as u64)
            })
            .await?;
        debug!(cutoff_ms, removed, "deleted expired messages");
        Ok(removed)
    }

    /// Remove every message. Returns the number removed. Used on logout
    /// and cache reset.
    pub async fn clear_all(&self) -> Result<u64, CacheError> {
        let removed = self
            .with_conn(|conn| {
                let n = conn.execute(schema::DELETE_ALL, [])?;
                Ok(n as u64)
            })
            .await?;
        debug!(removed, "cleared message cache");
        Ok(removed)
    }

    // ============================================
    // READS
    // ============================================

    /// Every cached message, ascending by timestamp. Snapshot at call time.
    pub async fn get_all(&self) -> Result<Vec<Message>, CacheError> {
        self.with_conn(|conn| query_messages(conn, schema::SELECT_ALL, []))
            .await
    }

    /// Messages for one session, ascending by timestamp. Exact match only.
    pub async fn get_by_session(&self, session_id: &str) -> Result<Vec<Message>, CacheError> {
        if session_id.is_empty() {
            return Err(CacheError::Query("session id must not be empty".into()));
        }

        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            query_messages(conn, schema::SELECT_BY_SESSION, params![session_id])
        })
        .await
    }

    /// Total number of cached messages.
    pub async fn count(&self) -> Result<u64, CacheError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(schema::COUNT_ALL, [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }

    // ============================================
    // LIFECYCLE
    // ============================================

    /// Release the handle. The next operation transparently reopens.
    pub async fn close(&self) {
        self.manager.close().await;
    }

    /// Close, delete the database file, and reopen fresh. The explicit
    /// recovery path for a corrupt file; all cached history is lost, which
    /// is acceptable for a mirror the backend can repopulate.
    pub async fn reset(&self) -> Result<(), CacheError> {
        self.manager.destroy().await?;
        self.manager.handle().await?;
        Ok(())
    }

    /// Acquire the handle and run blocking rusqlite work off the async
    /// runtime. Sequentially awaited operations observe each other's
    /// effects; concurrent callers get no ordering guarantee beyond the
    /// connection lock.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CacheError> + Send + 'static,
    {
        let handle: Arc<DbHandle> = self.manager.handle().await?;
        tokio::task::spawn_blocking(move || handle.with_conn(f))
            .await
            .map_err(|e| CacheError::Io(format!("storage task failed: {e}")))?
    }
}

fn query_messages(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Message>, CacheError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(Message {
            id: row.get(0)?,
            content: row.get(1)?,
            is_ai: row.get(2)?,
            timestamp: row.get(3)?,
            session_id: row.get(4)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}
