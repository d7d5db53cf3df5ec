use serde::{Deserialize, Serialize};

use super::defaults;

/// Trigger decision engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Per-session cooldown between oracle-backed analyses.
    pub cooldown_secs: u64,
    /// Window entries included verbatim in the oracle digest.
    pub digest_entries: usize,
    /// Window entries fingerprinted for the already-analyzed check.
    pub dedup_window_entries: usize,
    /// Upper bound on a single oracle call.
    pub oracle_timeout_secs: u64,
    /// Confidence floors per research type.
    pub direct_confidence_floor: f64,
    pub alternative_confidence_floor: f64,
    pub validation_confidence_floor: f64,
    /// Enable the zero-latency pattern path on tool output.
    pub quick_analysis_enabled: bool,
    /// Enable stuck / strategic proactive triggers.
    pub proactive_enabled: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: defaults::DEFAULT_TRIGGER_COOLDOWN_SECS,
            digest_entries: defaults::DEFAULT_DIGEST_ENTRIES,
            dedup_window_entries: defaults::DEFAULT_DEDUP_WINDOW_ENTRIES,
            oracle_timeout_secs: defaults::DEFAULT_ORACLE_TIMEOUT_SECS,
            direct_confidence_floor: defaults::DEFAULT_DIRECT_CONFIDENCE_FLOOR,
            alternative_confidence_floor: defaults::DEFAULT_ALTERNATIVE_CONFIDENCE_FLOOR,
            validation_confidence_floor: defaults::DEFAULT_VALIDATION_CONFIDENCE_FLOOR,
            quick_analysis_enabled: true,
            proactive_enabled: true,
        }
    }
}
