//! Source reliability ledger. Rows only change by additive upsert.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::SourceQualityEntry;

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

/// One citation of `domain` for `topic`.
///
/// `reliability = helpful / (citations + 1)` after the increment, so a first
/// helpful citation lands at 0.5 and a second at 2/3.
pub fn record_citation(
    conn: &Connection,
    domain: &str,
    topic: &str,
    helpful_increment: f64,
    now: DateTime<Utc>,
) -> ScoutResult<SourceQualityEntry> {
    let inc = helpful_increment.max(0.0);
    conn.execute(
        "INSERT INTO source_quality (domain, topic, reliability, citation_count, helpful_count, last_cited)
         VALUES (?1, ?2, MIN(1.0, ?3 / 2.0), 1, ?3, ?4)
         ON CONFLICT(domain, topic) DO UPDATE SET
            citation_count = citation_count + 1,
            helpful_count = helpful_count + excluded.helpful_count,
            reliability = MAX(0.0, MIN(1.0,
                (helpful_count + excluded.helpful_count) / (citation_count + 2.0))),
            last_cited = excluded.last_cited",
        params![domain, topic, inc, fmt_dt(&now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    get_source_quality(conn, domain, topic)?.ok_or_else(|| {
        ScoutError::ValidationError(format!("source quality row missing for {domain}/{topic}"))
    })
}

/// Correct the helpful count of a row that was already cited, keeping the
/// citation count. The count never drops below zero.
pub fn adjust_helpful(
    conn: &Connection,
    domain: &str,
    topic: &str,
    delta: f64,
) -> ScoutResult<Option<SourceQualityEntry>> {
    conn.execute(
        "UPDATE source_quality SET
            helpful_count = MAX(0.0, helpful_count + ?3),
            reliability = MAX(0.0, MIN(1.0,
                MAX(0.0, helpful_count + ?3) / (citation_count + 1.0)))
         WHERE domain = ?1 AND topic = ?2",
        params![domain, topic, delta],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    get_source_quality(conn, domain, topic)
}

pub fn get_source_quality(
    conn: &Connection,
    domain: &str,
    topic: &str,
) -> ScoutResult<Option<SourceQualityEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT domain, topic, reliability, citation_count, helpful_count, last_cited
             FROM source_quality WHERE domain = ?1 AND topic = ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![domain, topic], |row| Ok(row_to_entry(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

/// Most reliable domains for a topic.
pub fn top_sources(
    conn: &Connection,
    topic: &str,
    limit: usize,
) -> ScoutResult<Vec<SourceQualityEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT domain, topic, reliability, citation_count, helpful_count, last_cited
             FROM source_quality WHERE topic = ?1
             ORDER BY reliability DESC, citation_count DESC LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![topic, limit as i64], |row| Ok(row_to_entry(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(entries)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> ScoutResult<SourceQualityEntry> {
    let last_cited: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(SourceQualityEntry {
        domain: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        topic: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        reliability: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        citation_count: row
            .get::<_, i64>(3)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as u64,
        helpful_count: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        last_cited: parse_dt(&last_cited)?,
    })
}
