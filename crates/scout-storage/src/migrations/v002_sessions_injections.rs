//! v002: sessions, injection_log.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ScoutResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            id              TEXT PRIMARY KEY,
            project_path    TEXT,
            started_at      TEXT NOT NULL,
            last_activity   TEXT NOT NULL,
            ended_at        TEXT,
            active          INTEGER NOT NULL DEFAULT 1,
            snapshot        TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS injection_log (
            id                  TEXT PRIMARY KEY,
            finding_id          TEXT NOT NULL,
            session_id          TEXT NOT NULL,
            injected_at         TEXT NOT NULL,
            disclosure_level    INTEGER NOT NULL DEFAULT 1,
            trigger_reason      TEXT NOT NULL DEFAULT '',
            followup_injected   INTEGER NOT NULL DEFAULT 0,
            effectiveness       REAL,
            resolved_issue      INTEGER NOT NULL DEFAULT 0,
            tokens              INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_injection_session ON injection_log(session_id);
        CREATE INDEX IF NOT EXISTS idx_injection_finding ON injection_log(finding_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
