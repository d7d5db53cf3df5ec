//! Research finding upsert, lookup, and recency queries.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::{ScoutResult, StorageError};
use scout_core::models::{FindingSource, KeyPoint, ResearchDepth, ResearchFinding};

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

const FINDING_COLUMNS: &str = "id, task_id, query, summary, key_points, full_content, sources,
    domain, depth, confidence, created_at, last_accessed, project_path";

/// Insert or replace a finding. Key points and sources are stored as JSON.
pub fn upsert_finding(conn: &Connection, finding: &ResearchFinding) -> ScoutResult<()> {
    let key_points_json =
        serde_json::to_string(&finding.key_points).map_err(|e| to_storage_err(e.to_string()))?;
    let sources_json =
        serde_json::to_string(&finding.sources).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO research_findings (
            id, task_id, query, summary, key_points, full_content, sources,
            domain, depth, confidence, created_at, last_accessed, project_path
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(id) DO UPDATE SET
            task_id = excluded.task_id,
            query = excluded.query,
            summary = excluded.summary,
            key_points = excluded.key_points,
            full_content = excluded.full_content,
            sources = excluded.sources,
            domain = excluded.domain,
            depth = excluded.depth,
            confidence = excluded.confidence,
            last_accessed = excluded.last_accessed,
            project_path = excluded.project_path",
        params![
            finding.id,
            finding.task_id,
            finding.query,
            finding.summary,
            key_points_json,
            finding.full_content,
            sources_json,
            finding.domain,
            finding.depth.as_str(),
            finding.confidence,
            fmt_dt(&finding.created_at),
            fmt_dt(&finding.last_accessed),
            finding.project_path,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_finding(conn: &Connection, id: &str) -> ScoutResult<Option<ResearchFinding>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {FINDING_COLUMNS} FROM research_findings WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id], |row| Ok(row_to_finding(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn touch_finding(conn: &Connection, id: &str, now: DateTime<Utc>) -> ScoutResult<()> {
    conn.execute(
        "UPDATE research_findings SET last_accessed = ?2 WHERE id = ?1",
        params![id, fmt_dt(&now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn list_findings(conn: &Connection, limit: usize) -> ScoutResult<Vec<ResearchFinding>> {
    query_findings(
        conn,
        &format!(
            "SELECT {FINDING_COLUMNS} FROM research_findings
             WHERE created_at >= ?1 ORDER BY created_at DESC LIMIT ?2"
        ),
        "",
        limit,
    )
}

pub fn recent_findings(
    conn: &Connection,
    since: DateTime<Utc>,
    limit: usize,
) -> ScoutResult<Vec<ResearchFinding>> {
    query_findings(
        conn,
        &format!(
            "SELECT {FINDING_COLUMNS} FROM research_findings
             WHERE created_at >= ?1 ORDER BY created_at DESC LIMIT ?2"
        ),
        &fmt_dt(&since),
        limit,
    )
}

fn query_findings(
    conn: &Connection,
    sql: &str,
    since: &str,
    limit: usize,
) -> ScoutResult<Vec<ResearchFinding>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![since, limit as i64], |row| Ok(row_to_finding(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut findings = Vec::new();
    for row in rows {
        findings.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(findings)
}

fn row_to_finding(row: &rusqlite::Row<'_>) -> ScoutResult<ResearchFinding> {
    let get_str = |idx: usize| -> ScoutResult<String> {
        row.get::<_, String>(idx)
            .map_err(|e| to_storage_err(e.to_string()))
    };
    let get_opt = |idx: usize| -> ScoutResult<Option<String>> {
        row.get::<_, Option<String>>(idx)
            .map_err(|e| to_storage_err(e.to_string()))
    };

    let key_points: Vec<KeyPoint> = serde_json::from_str(&get_str(4)?)
        .map_err(|e| to_storage_err(format!("parse key_points: {e}")))?;
    let sources: Vec<FindingSource> = serde_json::from_str(&get_str(6)?)
        .map_err(|e| to_storage_err(format!("parse sources: {e}")))?;
    let depth_str = get_str(8)?;
    let depth = ResearchDepth::parse(&depth_str).ok_or_else(|| StorageError::CorruptRow {
        table: "research_findings".to_string(),
        details: format!("depth '{depth_str}'"),
    })?;

    Ok(ResearchFinding {
        id: get_str(0)?,
        task_id: get_opt(1)?,
        query: get_str(2)?,
        summary: get_str(3)?,
        key_points,
        full_content: get_str(5)?,
        sources,
        domain: get_opt(7)?,
        depth,
        confidence: row
            .get::<_, f64>(9)
            .map_err(|e| to_storage_err(e.to_string()))?,
        created_at: parse_dt(&get_str(10)?)?,
        last_accessed: parse_dt(&get_str(11)?)?,
        project_path: get_opt(12)?,
    })
}
