//! # scout-storage
//!
//! SQLite persistence for the research pipeline: tasks, findings, sessions,
//! the injection log, the source-quality ledger and the durable URL cache.
//! One write connection, a read pool, WAL mode, ordered migrations.

pub mod cache;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod recovery;

pub use cache::{normalize_url, ttl_for_domain, CachingFetcher};
pub use engine::StorageEngine;

use scout_core::errors::{ScoutError, StorageError};

/// Wrap a message as a storage error.
pub fn to_storage_err(message: String) -> ScoutError {
    ScoutError::StorageError(StorageError::SqliteError { message })
}
