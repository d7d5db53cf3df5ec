use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::FindingSource;

/// Progressive disclosure tier. 1 = summary, 2 = key points, 3 = full content.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureLevel {
    #[default]
    Summary = 1,
    KeyPoints = 2,
    Full = 3,
}

impl DisclosureLevel {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(level: u8) -> Self {
        match level {
            0 | 1 => Self::Summary,
            2 => Self::KeyPoints,
            _ => Self::Full,
        }
    }

    /// Next tier, saturating at `Full`.
    pub fn next(&self) -> Self {
        match self {
            Self::Summary => Self::KeyPoints,
            Self::KeyPoints | Self::Full => Self::Full,
        }
    }
}

/// Content waiting in a session for the next event. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInjection {
    pub query: String,
    pub summary: String,
    /// Candidate score in [0, 1].
    pub relevance: f64,
    pub priority: u8,
    pub queued_at: DateTime<Utc>,
    /// Suggested change of direction, if any.
    pub pivot: Option<String>,
    pub finding_id: Option<String>,
    pub task_id: Option<String>,
    pub sources: Vec<FindingSource>,
}

/// One delivered injection and its measured effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionLogEntry {
    pub id: String,
    pub finding_id: String,
    pub session_id: String,
    pub injected_at: DateTime<Utc>,
    pub disclosure_level: DisclosureLevel,
    pub trigger_reason: String,
    pub followup_injected: bool,
    /// Score in [-1, 1] once recorded.
    pub effectiveness: Option<f64>,
    pub resolved_issue: bool,
    /// Tokens in the delivered block.
    pub tokens: usize,
}

impl InjectionLogEntry {
    pub fn new(
        finding_id: impl Into<String>,
        session_id: impl Into<String>,
        level: DisclosureLevel,
        trigger_reason: impl Into<String>,
        tokens: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            finding_id: finding_id.into(),
            session_id: session_id.into(),
            injected_at: Utc::now(),
            disclosure_level: level,
            trigger_reason: trigger_reason.into(),
            followup_injected: false,
            effectiveness: None,
            resolved_issue: false,
            tokens,
        }
    }
}
