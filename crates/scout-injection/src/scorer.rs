//! Static multi-factor candidate score.
//!
//! Factors: confidence, recency, task priority, source count and optional
//! overlap with the session's topics. Each term is capped at its weight and
//! the total is clamped to [0, 1].

use chrono::{DateTime, Utc};
use serde::Serialize;

use scout_core::models::ResearchFinding;
use scout_session::SessionContext;

const W_CONFIDENCE: f64 = 0.3;
const W_OVERLAP: f64 = 0.25;

/// Recency bonus by finding age.
const RECENCY: [(i64, f64); 3] = [(5 * 60, 0.3), (30 * 60, 0.2), (2 * 60 * 60, 0.1)];

/// Score breakdown for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub confidence: f64,
    pub recency: f64,
    pub priority: f64,
    pub sources: f64,
    pub overlap: f64,
    pub total: f64,
}

/// Score a finding produced for a task of `priority`. `overlap` is the
/// fraction of session terms the finding mentions, when known.
pub fn score_candidate(
    finding: &ResearchFinding,
    priority: u8,
    overlap: Option<f64>,
    now: DateTime<Utc>,
) -> CandidateScore {
    let confidence = (finding.confidence.clamp(0.0, 1.0) * W_CONFIDENCE).min(W_CONFIDENCE);

    let age = (now - finding.created_at).num_seconds().max(0);
    let recency = RECENCY
        .iter()
        .find(|(max_age, _)| age <= *max_age)
        .map_or(0.0, |(_, bonus)| *bonus);

    let priority = match priority {
        p if p >= 8 => 0.2,
        p if p >= 6 => 0.1,
        _ => 0.0,
    };

    let sources = match finding.sources.len() {
        n if n >= 5 => 0.15,
        n if n >= 3 => 0.1,
        _ => 0.0,
    };

    let overlap = overlap.map_or(0.0, |o| (o.clamp(0.0, 1.0) * W_OVERLAP).min(W_OVERLAP));

    let total = (confidence + recency + priority + sources + overlap).clamp(0.0, 1.0);
    CandidateScore {
        confidence,
        recency,
        priority,
        sources,
        overlap,
        total,
    }
}

/// Fraction of the session's topics, tech stack and focus area that appear in
/// the finding's query or summary. `None` when the session has no terms yet.
pub fn session_overlap(finding: &ResearchFinding, ctx: &SessionContext) -> Option<f64> {
    let mut terms: Vec<String> = ctx
        .topics
        .iter()
        .chain(ctx.tech_stack.iter())
        .map(|t| t.to_lowercase())
        .collect();
    if let Some(area) = ctx.focus.current() {
        terms.push(area.to_lowercase());
    }
    terms.sort();
    terms.dedup();
    if terms.is_empty() {
        return None;
    }

    let text = format!("{} {}", finding.query, finding.summary).to_lowercase();
    let hits = terms.iter().filter(|t| text.contains(t.as_str())).count();
    Some(hits as f64 / terms.len() as f64)
}

/// Index of the highest total at or above `min_score`. Ties keep the earlier.
pub fn best_candidate(scores: &[CandidateScore], min_score: f64) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.total >= min_score)
        .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
            Some((_, top)) if top >= s.total => best,
            _ => Some((i, s.total)),
        })
        .map(|(i, _)| i)
}
