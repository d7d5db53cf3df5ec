//! Durable URL cache. Reads bump the hit count; expired rows are evicted lazily.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use scout_core::errors::ScoutResult;
use scout_core::models::UrlCacheEntry;

use super::{fmt_dt, parse_dt};
use crate::to_storage_err;

/// Fresh entry with its hit count incremented, or `None`. An expired row is deleted.
pub fn cache_get(
    conn: &Connection,
    normalized_url: &str,
    now: DateTime<Utc>,
) -> ScoutResult<Option<UrlCacheEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT normalized_url, raw_url, title, content, content_length,
                    scraped_at, expires_at, hit_count
             FROM url_cache WHERE normalized_url = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let entry = stmt
        .query_row(params![normalized_url], |row| Ok(row_to_entry(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()?;

    let Some(mut entry) = entry else {
        return Ok(None);
    };

    if entry.is_expired(now) {
        conn.execute(
            "DELETE FROM url_cache WHERE normalized_url = ?1",
            params![normalized_url],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        tracing::debug!(url = %normalized_url, "evicted expired cache entry");
        return Ok(None);
    }

    conn.execute(
        "UPDATE url_cache SET hit_count = hit_count + 1 WHERE normalized_url = ?1",
        params![normalized_url],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    entry.hit_count += 1;
    Ok(Some(entry))
}

/// Insert or replace. A refreshed page resets its hit count.
pub fn cache_put(conn: &Connection, entry: &UrlCacheEntry) -> ScoutResult<()> {
    conn.execute(
        "INSERT INTO url_cache (
            normalized_url, raw_url, title, content, content_length,
            scraped_at, expires_at, hit_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(normalized_url) DO UPDATE SET
            raw_url = excluded.raw_url,
            title = excluded.title,
            content = excluded.content,
            content_length = excluded.content_length,
            scraped_at = excluded.scraped_at,
            expires_at = excluded.expires_at,
            hit_count = excluded.hit_count",
        params![
            entry.normalized_url,
            entry.raw_url,
            entry.title,
            entry.content,
            entry.content_length as i64,
            fmt_dt(&entry.scraped_at),
            fmt_dt(&entry.expires_at),
            entry.hit_count as i64,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn cache_purge_expired(conn: &Connection, now: DateTime<Utc>) -> ScoutResult<usize> {
    conn.execute(
        "DELETE FROM url_cache WHERE expires_at <= ?1",
        params![fmt_dt(&now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> ScoutResult<UrlCacheEntry> {
    let scraped_at: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let expires_at: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(UrlCacheEntry {
        normalized_url: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        raw_url: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        title: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        content_length: row
            .get::<_, i64>(4)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as usize,
        scraped_at: parse_dt(&scraped_at)?,
        expires_at: parse_dt(&expires_at)?,
        hit_count: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))?
            .max(0) as u64,
    })
}
