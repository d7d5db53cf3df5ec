//! v004: url_cache.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ScoutResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS url_cache (
            normalized_url  TEXT PRIMARY KEY,
            raw_url         TEXT NOT NULL,
            title           TEXT,
            content         TEXT NOT NULL,
            content_length  INTEGER NOT NULL,
            scraped_at      TEXT NOT NULL,
            expires_at      TEXT NOT NULL,
            hit_count       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_url_cache_expires ON url_cache(expires_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
