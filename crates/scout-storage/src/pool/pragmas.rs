//! PRAGMA configuration applied to every SQLite connection.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

/// WAL, NORMAL sync, 64MB cache, foreign keys, configurable busy timeout.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ScoutResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Read connections only need the timeout and cache settings.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ScoutResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Whether WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> ScoutResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
