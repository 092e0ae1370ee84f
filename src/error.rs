//! Typed errors for the message cache.
//!
//! Four buckets, matching what a caller can actually do about each:
//! give up on local history (`Initialization`), retry (`Locked`), fix
//! the call site (`Query`), or reset the cache file (`Io`).

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The database file could not be opened, created, or migrated.
    /// Fatal for the cache subsystem; the host should degrade to
    /// network-only history rather than crash.
    #[error("message cache initialization failed: {0}")]
    Initialization(String),

    /// Transient write contention from SQLite. Safe to retry; this layer
    /// never retries internally so callers keep control of the policy.
    #[error("message cache is locked: {0}")]
    Locked(String),

    /// Malformed caller input (empty id or session id, negative cutoff).
    /// Not retryable; indicates a bug at the call site.
    #[error("invalid query argument: {0}")]
    Query(String),

    /// The underlying storage is unreadable or corrupt. The explicit
    /// recovery path is [`crate::MessageStore::reset`].
    #[error("message cache storage failure: {0}")]
    Io(String),
}

impl CacheError {
    /// True only for transient contention; everything else is permanent
    /// from this layer's point of view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::Locked(_))
    }

    pub(crate) fn init(err: impl std::fmt::Display) -> Self {
        CacheError::Initialization(err.to_string())
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    CacheError::Locked(err.to_string())
                }
                _ => CacheError::Io(err.to_string()),
            },
            _ => CacheError::Io(err.to_string()),
        }
    }
}
