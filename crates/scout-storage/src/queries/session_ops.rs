//! Session snapshot persistence.

use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::ScoutResult;
use scout_core::models::SessionRecord;

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

/// Insert or refresh a session snapshot. An ended session stays ended unless
/// the record belongs to a later incarnation (newer `started_at`) of the same id.
pub fn save_session(conn: &Connection, record: &SessionRecord) -> ScoutResult<()> {
    conn.execute(
        "INSERT INTO sessions (id, project_path, started_at, last_activity, ended_at, active, snapshot)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            project_path = COALESCE(excluded.project_path, sessions.project_path),
            last_activity = excluded.last_activity,
            ended_at = CASE WHEN excluded.started_at > sessions.started_at
                            THEN excluded.ended_at
                            ELSE COALESCE(sessions.ended_at, excluded.ended_at) END,
            active = CASE WHEN excluded.started_at > sessions.started_at THEN excluded.active
                          WHEN sessions.ended_at IS NOT NULL THEN 0
                          ELSE excluded.active END,
            started_at = MAX(sessions.started_at, excluded.started_at),
            snapshot = excluded.snapshot",
        params![
            record.id,
            record.project_path,
            fmt_dt(&record.started_at),
            fmt_dt(&record.last_activity),
            record.ended_at.as_ref().map(fmt_dt),
            record.active as i32,
            record.snapshot.to_string(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_session(conn: &Connection, id: &str) -> ScoutResult<Option<SessionRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, project_path, started_at, last_activity, ended_at, active, snapshot
             FROM sessions WHERE id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let raw = stmt
        .query_row(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((id, project_path, started, last, ended, active, snapshot)) = raw else {
        return Ok(None);
    };
    Ok(Some(SessionRecord {
        id,
        project_path,
        started_at: parse_dt(&started)?,
        last_activity: parse_dt(&last)?,
        ended_at: ended.as_deref().map(parse_dt).transpose()?,
        active: active != 0,
        snapshot: serde_json::from_str(&snapshot)
            .map_err(|e| to_storage_err(format!("parse snapshot: {e}")))?,
    }))
}
