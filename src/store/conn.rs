//! Connection lifecycle for the single on-disk handle.
//!
//! One `ConnectionManager` per store, one live `rusqlite::Connection`
//! behind it. The connection opens lazily on first use; the open path
//! (create directories, open file, pragmas, migrations) runs exactly once
//! even under concurrent first calls, because it executes while holding
//! the async state mutex. Callers that arrive mid-open await that same
//! open instead of starting a second one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::debug;

use crate::error::CacheError;
use crate::store::{migrate, schema};

/// The shared handle: the connection plus the lock serializing access
/// to it. Blocking operations lock it from `spawn_blocking` threads.
#[derive(Debug)]
pub(crate) struct DbHandle {
    conn: Mutex<Connection>,
}

impl DbHandle {
    /// Run `f` against the connection. SQLite errors are classified into
    /// the cache taxonomy by the `From` impl on `CacheError`.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CacheError::Io("connection mutex poisoned".to_string()))?;
        f(&conn)
    }
}

pub(crate) struct ConnectionManager {
    path: PathBuf,
    state: tokio::sync::Mutex<Option<Arc<DbHandle>>>,
}

impl ConnectionManager {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: tokio::sync::Mutex::new(None),
        }
    }

    /// Get the live handle, opening the database on first use.
    ///
    /// On failure the state stays closed and the next call retries the
    /// full open path.
    pub(crate) async fn handle(&self) -> Result<Arc<DbHandle>, CacheError> {
        let mut state = self.state.lock().await;
        if let Some(handle) = state.as_ref() {
            return Ok(handle.clone());
        }

        let path = self.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_and_migrate(&path))
            .await
            .map_err(|e| CacheError::Initialization(format!("open task failed: {e}")))??;

        let handle = Arc::new(DbHandle {
            conn: Mutex::new(conn),
        });
        *state = Some(handle.clone());
        Ok(handle)
    }

    /// Drop the cached handle. The connection closes once any in-flight
    /// operation releases its reference; the next `handle()` call reopens.
    pub(crate) async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            debug!(path = %self.path.display(), "message cache closed");
        }
    }

    /// Close and delete the database file (plus WAL sidecars). Explicit
    /// recovery from corruption; the data loss is the point.
    pub(crate) async fn destroy(&self) -> Result<(), CacheError> {
        let mut state = self.state.lock().await;
        state.take();

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || remove_db_files(&path))
            .await
            .map_err(|e| CacheError::Io(format!("destroy task failed: {e}")))??;

        debug!(path = %self.path.display(), "message cache destroyed");
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Blocking open path: parent directories, file open, pragmas, migrations.
/// Everything here maps to `Initialization`; a file that cannot be opened
/// or brought to the current schema version yields no handle at all.
fn open_and_migrate(path: &Path) -> Result<Connection, CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(CacheError::init)?;
    }

    let mut conn = Connection::open(path).map_err(CacheError::init)?;
    conn.execute_batch(schema::CONNECTION_PRAGMAS)
        .map_err(CacheError::init)?;
    migrate::run(&mut conn)?;

    debug!(path = %path.display(), "message cache opened");
    Ok(conn)
}

fn remove_db_files(path: &Path) -> Result<(), CacheError> {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        match std::fs::remove_file(PathBuf::from(file)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::Io(e.to_string())),
        }
    }
    Ok(())
}
