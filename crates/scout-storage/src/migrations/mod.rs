//! Ordered, idempotent schema migrations tracked in `schema_version`.

pub mod v001_tasks_findings;
pub mod v002_sessions_injections;
pub mod v003_source_quality;
pub mod v004_url_cache;
pub mod v005_task_attempts;

use rusqlite::{params, Connection};

use scout_core::errors::{ScoutResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> ScoutResult<()>;

const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[
    (1, "tasks_findings", v001_tasks_findings::migrate),
    (2, "sessions_injections", v002_sessions_injections::migrate),
    (3, "source_quality", v003_source_quality::migrate),
    (4, "url_cache", v004_url_cache::migrate),
    (5, "task_attempts", v005_task_attempts::migrate),
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 5;

/// Apply every migration newer than the recorded version, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> ScoutResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    let mut applied = 0;

    for (version, name, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration {version} begin: {e}")))?;
        let outcome = migrate(&tx).and_then(|_| {
            tx.execute(
                "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
                params![version, name],
            )
            .map_err(|e| to_storage_err(e.to_string()))
        });
        match outcome {
            Ok(_) => {
                tx.commit()
                    .map_err(|e| to_storage_err(format!("migration {version} commit: {e}")))?;
                tracing::info!(version = *version, name = *name, "applied migration");
                applied += 1;
            }
            Err(e) => {
                let _ = tx.rollback();
                return Err(StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                }
                .into());
            }
        }
    }

    Ok(applied)
}

/// Highest applied version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> ScoutResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Whether `table` has a column named `column`.
pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> ScoutResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| to_storage_err(e.to_string()))?;
    for name in names {
        if name.map_err(|e| to_storage_err(e.to_string()))? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
