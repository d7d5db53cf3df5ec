use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted session snapshot. Written on update and end; never reloaded
/// into a live context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub project_path: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub snapshot: serde_json::Value,
}
