use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::ResearchDepth;

/// A cited source with its quality at the time of synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingSource {
    pub title: String,
    pub url: String,
    /// Host of `url`, lowercased.
    pub domain: String,
    /// Quality in [0, 1].
    pub quality: f64,
    /// Adapter that returned the source.
    pub adapter: String,
}

/// A key point. Lower tiers are more important and rendered first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub text: String,
    pub tier: u8,
}

impl KeyPoint {
    pub fn new(text: impl Into<String>, tier: u8) -> Self {
        Self {
            text: text.into(),
            tier,
        }
    }
}

/// Durable research outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub id: String,
    /// Task that produced this finding, when known.
    pub task_id: Option<String>,
    pub query: String,
    pub summary: String,
    /// Ordered by tier, then by synthesis order.
    pub key_points: Vec<KeyPoint>,
    pub full_content: String,
    pub sources: Vec<FindingSource>,
    /// Topic domain, e.g. "rust" or "react".
    pub domain: Option<String>,
    pub depth: ResearchDepth,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub project_path: Option<String>,
}

impl ResearchFinding {
    /// Distinct source domains in citation order.
    pub fn source_domains(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in &self.sources {
            if !s.domain.is_empty() && !out.contains(&s.domain) {
                out.push(s.domain.clone());
            }
        }
        out
    }
}
