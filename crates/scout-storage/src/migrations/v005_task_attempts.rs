//! v005: additive columns. research_tasks.attempts, research_findings.task_id.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use super::column_exists;
use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ScoutResult<()> {
    if !column_exists(conn, "research_tasks", "attempts")? {
        conn.execute_batch(
            "ALTER TABLE research_tasks ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    if !column_exists(conn, "research_findings", "task_id")? {
        conn.execute_batch("ALTER TABLE research_findings ADD COLUMN task_id TEXT;")
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
