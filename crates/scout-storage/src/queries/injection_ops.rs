//! Injection log writes and effectiveness queries.

use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::{DepthOutcome, DisclosureLevel, InjectionLogEntry, ResearchDepth};

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

const INJECTION_COLUMNS: &str = "id, finding_id, session_id, injected_at, disclosure_level,
    trigger_reason, followup_injected, effectiveness, resolved_issue, tokens";

pub fn insert_injection(conn: &Connection, entry: &InjectionLogEntry) -> ScoutResult<()> {
    conn.execute(
        "INSERT INTO injection_log (
            id, finding_id, session_id, injected_at, disclosure_level, trigger_reason,
            followup_injected, effectiveness, resolved_issue, tokens
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.id,
            entry.finding_id,
            entry.session_id,
            fmt_dt(&entry.injected_at),
            entry.disclosure_level.as_u8(),
            entry.trigger_reason,
            entry.followup_injected as i32,
            entry.effectiveness,
            entry.resolved_issue as i32,
            entry.tokens as i64,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_injection(conn: &Connection, id: &str) -> ScoutResult<Option<InjectionLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {INJECTION_COLUMNS} FROM injection_log WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id], |row| Ok(row_to_injection(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

/// Oldest first.
pub fn injections_for_session(
    conn: &Connection,
    session_id: &str,
) -> ScoutResult<Vec<InjectionLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {INJECTION_COLUMNS} FROM injection_log
             WHERE session_id = ?1 ORDER BY injected_at ASC"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![session_id], |row| Ok(row_to_injection(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(entries)
}

pub fn record_effectiveness(
    conn: &Connection,
    id: &str,
    score: f64,
    resolved: bool,
) -> ScoutResult<()> {
    let rows = conn
        .execute(
            "UPDATE injection_log SET effectiveness = ?2, resolved_issue = ?3 WHERE id = ?1",
            params![id, score.clamp(-1.0, 1.0), resolved as i32],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if rows == 0 {
        return Err(ScoutError::InjectionNotFound { id: id.to_string() });
    }
    Ok(())
}

pub fn mark_followup_injected(conn: &Connection, id: &str) -> ScoutResult<()> {
    let rows = conn
        .execute(
            "UPDATE injection_log SET followup_injected = 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if rows == 0 {
        return Err(ScoutError::InjectionNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Scored injections joined to their finding's depth, for one topic domain.
pub fn depth_outcomes(conn: &Connection, domain: &str) -> ScoutResult<Vec<DepthOutcome>> {
    let mut stmt = conn
        .prepare(
            "SELECT f.depth, i.effectiveness
             FROM injection_log i
             JOIN research_findings f ON f.id = i.finding_id
             WHERE f.domain = ?1 AND i.effectiveness IS NOT NULL",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![domain], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut outcomes = Vec::new();
    for row in rows {
        let (depth, score) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if let Some(depth) = ResearchDepth::parse(&depth) {
            outcomes.push(DepthOutcome {
                depth,
                helpful: score > 0.0,
            });
        }
    }
    Ok(outcomes)
}

fn row_to_injection(row: &rusqlite::Row<'_>) -> ScoutResult<InjectionLogEntry> {
    let injected_at: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(InjectionLogEntry {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        finding_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        session_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        injected_at: parse_dt(&injected_at)?,
        disclosure_level: DisclosureLevel::from_u8(
            row.get::<_, u8>(4)
                .map_err(|e| to_storage_err(e.to_string()))?,
        ),
        trigger_reason: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        followup_injected: row
            .get::<_, i32>(6)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        effectiveness: row.get(7).map_err(|e| to_storage_err(e.to_string()))?,
        resolved_issue: row
            .get::<_, i32>(8)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        tokens: row
            .get::<_, i64>(9)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as usize,
    })
}
