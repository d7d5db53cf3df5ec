//! Runtime settings patch: thresholds, cooldowns and budgets that may be
//! changed on a live process.

use serde::{Deserialize, Serialize};

use super::ScoutConfig;
use crate::errors::ScoutResult;

/// Partial update applied to a live `ScoutConfig`. `None` leaves a value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub trigger_cooldown_secs: Option<u64>,
    pub quick_analysis_enabled: Option<bool>,
    pub proactive_enabled: Option<bool>,
    pub stuck_threshold: Option<u32>,
    pub strategic_tool_use_threshold: Option<u32>,
    pub inactivity_timeout_secs: Option<u64>,
    pub session_similarity: Option<f64>,
    pub history_similarity: Option<f64>,
    pub semantic_threshold: Option<f64>,
    pub max_concurrent_tasks: Option<usize>,
    pub max_injections_per_session: Option<u32>,
    pub max_tokens_per_injection: Option<usize>,
    pub max_total_tokens_per_session: Option<usize>,
    pub injection_cooldown_ms: Option<u64>,
    pub static_gate_enabled: Option<bool>,
    pub min_candidate_score: Option<f64>,
    pub relevance_gate_enabled: Option<bool>,
    pub relevance_threshold: Option<f64>,
}

impl SettingsPatch {
    /// Apply the patch to a copy of `base`, validate it, and return the result.
    /// `base` is untouched when validation fails.
    pub fn apply_to(&self, base: &ScoutConfig) -> ScoutResult<ScoutConfig> {
        let mut next = base.clone();

        if let Some(v) = self.trigger_cooldown_secs {
            next.trigger.cooldown_secs = v;
        }
        if let Some(v) = self.quick_analysis_enabled {
            next.trigger.quick_analysis_enabled = v;
        }
        if let Some(v) = self.proactive_enabled {
            next.trigger.proactive_enabled = v;
        }
        if let Some(v) = self.stuck_threshold {
            next.session.stuck_threshold = v;
        }
        if let Some(v) = self.strategic_tool_use_threshold {
            next.session.strategic_tool_use_threshold = v;
        }
        if let Some(v) = self.inactivity_timeout_secs {
            next.session.inactivity_timeout_secs = v;
        }
        if let Some(v) = self.session_similarity {
            next.dedup.session_similarity = v;
        }
        if let Some(v) = self.history_similarity {
            next.dedup.history_similarity = v;
        }
        if let Some(v) = self.semantic_threshold {
            next.dedup.semantic_threshold = v;
        }
        if let Some(v) = self.max_concurrent_tasks {
            next.tasks.max_concurrent = v;
        }
        if let Some(v) = self.max_injections_per_session {
            next.injection.max_per_session = v;
        }
        if let Some(v) = self.max_tokens_per_injection {
            next.injection.max_tokens_per_injection = v;
        }
        if let Some(v) = self.max_total_tokens_per_session {
            next.injection.max_total_tokens_per_session = v;
        }
        if let Some(v) = self.injection_cooldown_ms {
            next.injection.cooldown_ms = v;
        }
        if let Some(v) = self.static_gate_enabled {
            next.injection.static_gate_enabled = v;
        }
        if let Some(v) = self.min_candidate_score {
            next.injection.min_candidate_score = v;
        }
        if let Some(v) = self.relevance_gate_enabled {
            next.injection.relevance_gate_enabled = v;
        }
        if let Some(v) = self.relevance_threshold {
            next.injection.relevance_threshold = v;
        }

        next.validate()?;
        Ok(next)
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| {
                v.as_object()
                    .map(|o| o.values().all(|v| v.is_null()))
                    .unwrap_or(true)
            })
            .unwrap_or(true)
    }
}
