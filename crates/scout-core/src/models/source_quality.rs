use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::ResearchDepth;

/// Reliability ledger row keyed by (domain, topic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQualityEntry {
    pub domain: String,
    pub topic: String,
    /// In [0, 1].
    pub reliability: f64,
    pub citation_count: u64,
    pub helpful_count: f64,
    pub last_cited: DateTime<Utc>,
}

/// Depth of a past finding and whether its injection helped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthOutcome {
    pub depth: ResearchDepth,
    pub helpful: bool,
}
