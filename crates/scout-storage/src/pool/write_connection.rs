//! Single write connection. All writes are serialized through it.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use scout_core::errors::{ScoutResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The write connection behind a blocking mutex. Critical sections are short
/// SQLite calls, so it is safe to take from async tasks.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> ScoutResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> ScoutResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> ScoutResult<T>
    where
        F: FnOnce(&Connection) -> ScoutResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            resource: "write connection".to_string(),
        })?;
        f(&guard)
    }
}
