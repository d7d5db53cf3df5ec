//! v001: research_tasks, research_findings.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ScoutResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS research_tasks (
            id              TEXT PRIMARY KEY,
            query           TEXT NOT NULL,
            context         TEXT,
            depth           TEXT NOT NULL,
            status          TEXT NOT NULL,
            trigger_source  TEXT NOT NULL,
            session_id      TEXT,
            priority        INTEGER NOT NULL DEFAULT 5,
            project_path    TEXT,
            created_at      TEXT NOT NULL,
            started_at      TEXT,
            completed_at    TEXT,
            result          TEXT,
            error           TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_status ON research_tasks(status);
        CREATE INDEX IF NOT EXISTS idx_tasks_created ON research_tasks(created_at);
        CREATE INDEX IF NOT EXISTS idx_tasks_session ON research_tasks(session_id);

        CREATE TABLE IF NOT EXISTS research_findings (
            id              TEXT PRIMARY KEY,
            query           TEXT NOT NULL,
            summary         TEXT NOT NULL DEFAULT '',
            key_points      TEXT NOT NULL DEFAULT '[]',
            full_content    TEXT NOT NULL DEFAULT '',
            sources         TEXT NOT NULL DEFAULT '[]',
            domain          TEXT,
            depth           TEXT NOT NULL,
            confidence      REAL NOT NULL DEFAULT 0.0,
            created_at      TEXT NOT NULL,
            last_accessed   TEXT NOT NULL,
            project_path    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_findings_created ON research_findings(created_at);
        CREATE INDEX IF NOT EXISTS idx_findings_domain ON research_findings(domain);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
