//! Tasks left `running` by a previous process can never finish. Fail them.

use chrono::Utc;
use rusqlite::{params, Connection};

use scout_core::errors::ScoutResult;

use crate::queries::fmt_dt;
use crate::to_storage_err;

/// Mark every `running` task failed with `reason`. Returns how many rows changed.
pub fn fail_running_tasks(conn: &Connection, reason: &str) -> ScoutResult<usize> {
    let count = conn
        .execute(
            "UPDATE research_tasks
             SET status = 'failed', error = ?1, completed_at = ?2
             WHERE status = 'running'",
            params![reason, fmt_dt(&Utc::now())],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if count > 0 {
        tracing::warn!(count, "recovered orphaned running tasks");
    }
    Ok(count)
}
