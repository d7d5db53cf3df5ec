use serde::{Deserialize, Serialize};

use super::defaults;

/// Deduplication engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Jaccard threshold against the findings history.
    pub history_similarity: f64,
    /// Jaccard threshold against the session's recent research.
    pub session_similarity: f64,
    /// Jaccard threshold against queries currently executing.
    pub inflight_similarity: f64,
    /// Cosine threshold when the vector index is ready.
    pub semantic_threshold: f64,
    /// Window for the per-session recent-research check.
    pub session_window_secs: u64,
    /// Window for the findings-history scan.
    pub history_window_secs: u64,
    /// Window for semantic matches.
    pub semantic_window_secs: u64,
    /// Max findings loaded for a history scan.
    pub history_scan_limit: usize,
    /// Prefer the vector index when it reports ready.
    pub semantic_enabled: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            history_similarity: defaults::DEFAULT_HISTORY_SIMILARITY,
            session_similarity: defaults::DEFAULT_SESSION_SIMILARITY,
            inflight_similarity: defaults::DEFAULT_INFLIGHT_SIMILARITY,
            semantic_threshold: defaults::DEFAULT_SEMANTIC_THRESHOLD,
            session_window_secs: defaults::DEFAULT_SESSION_DEDUP_WINDOW_SECS,
            history_window_secs: defaults::DEFAULT_HISTORY_WINDOW_SECS,
            semantic_window_secs: defaults::DEFAULT_SEMANTIC_WINDOW_SECS,
            history_scan_limit: defaults::DEFAULT_HISTORY_SCAN_LIMIT,
            semantic_enabled: true,
        }
    }
}
