//! SQL for each table. Every function takes a borrowed connection.

pub mod finding_ops;
pub mod injection_ops;
pub mod session_ops;
pub mod source_quality_ops;
pub mod task_ops;
pub mod url_cache_ops;

use chrono::{DateTime, SecondsFormat, Utc};

use scout_core::errors::ScoutResult;

use crate::to_storage_err;

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub(crate) fn fmt_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_dt(s: &str) -> ScoutResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}
