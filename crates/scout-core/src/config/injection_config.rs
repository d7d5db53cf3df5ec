use serde::{Deserialize, Serialize};

use super::defaults;

/// What the task-relevance gate does when no oracle answer is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceFallback {
    /// Compare the static candidate score against the relevance threshold.
    StaticScore,
    /// Let the candidate through.
    Admit,
    /// Drop the candidate.
    Reject,
}

/// Injection budget and scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Max delivered injections per session.
    pub max_per_session: u32,
    /// Max tokens in a single delivered block.
    pub max_tokens_per_injection: usize,
    /// Max cumulative delivered tokens per session.
    pub max_total_tokens_per_session: usize,
    /// Minimum spacing between two deliveries to one session.
    pub cooldown_ms: u64,
    /// Apply the static multi-factor score gate.
    pub static_gate_enabled: bool,
    /// Candidates scoring below this are discarded.
    pub min_candidate_score: f64,
    /// Apply the oracle task-relevance gate.
    pub relevance_gate_enabled: bool,
    /// Findings rated below this by the oracle are not queued.
    pub relevance_threshold: f64,
    /// Policy when the oracle cannot rate a finding.
    pub relevance_fallback: RelevanceFallback,
    /// Citations rendered per block.
    pub max_citations: usize,
    /// Time allowed for one oracle relevance rating.
    pub relevance_timeout_secs: u64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            max_per_session: defaults::DEFAULT_MAX_INJECTIONS_PER_SESSION,
            max_tokens_per_injection: defaults::DEFAULT_MAX_TOKENS_PER_INJECTION,
            max_total_tokens_per_session: defaults::DEFAULT_MAX_TOTAL_TOKENS_PER_SESSION,
            cooldown_ms: defaults::DEFAULT_INJECTION_COOLDOWN_MS,
            static_gate_enabled: true,
            min_candidate_score: defaults::DEFAULT_MIN_CANDIDATE_SCORE,
            relevance_gate_enabled: true,
            relevance_threshold: defaults::DEFAULT_RELEVANCE_THRESHOLD,
            relevance_fallback: RelevanceFallback::StaticScore,
            max_citations: defaults::DEFAULT_MAX_CITATIONS,
            relevance_timeout_secs: defaults::DEFAULT_RELEVANCE_TIMEOUT_SECS,
        }
    }
}
