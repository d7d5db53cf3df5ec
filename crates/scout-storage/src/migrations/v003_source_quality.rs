//! v003: source_quality ledger.

use rusqlite::Connection;

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ScoutResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS source_quality (
            domain          TEXT NOT NULL,
            topic           TEXT NOT NULL,
            reliability     REAL NOT NULL DEFAULT 0.5,
            citation_count  INTEGER NOT NULL DEFAULT 0,
            helpful_count   REAL NOT NULL DEFAULT 0.0,
            last_cited      TEXT NOT NULL,
            PRIMARY KEY (domain, topic)
        );

        CREATE INDEX IF NOT EXISTS idx_source_quality_topic ON source_quality(topic, reliability);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
