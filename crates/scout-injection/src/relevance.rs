//! Task-relevance gate.
//!
//! The oracle rates from 0 to 1 how well a finding serves what the session is
//! doing right now. Ratings below the threshold are not queued. With no oracle,
//! or when it fails, the configured fallback decides.

use std::fmt::Write;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use scout_core::config::{InjectionConfig, RelevanceFallback};
use scout_core::models::ResearchFinding;
use scout_core::traits::IOracle;
use scout_observability::degradation::{self, SharedDegradations};
use scout_session::SessionContext;

const COMPONENT: &str = "relevance_oracle";
const RECENT_ERRORS: usize = 3;

const NUMBER: &str = r"\d+(?:\.\d+)?";

/// "0.0 to 1.0", "between 0 and 1", "0-1": the scale, not a rating.
static RE_RANGE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){NUMBER}\s*(?:to|and|-|–)\s*{NUMBER}")).ok()
});
/// A number a few words after "rate", "rating", "score" or "relevance".
static RE_ANCHORED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:rat(?:e|ed|ing)|score|relevance)\b[^0-9\n]{{0,24}}?({NUMBER})"
    ))
    .ok()
});
static RE_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(NUMBER).ok());

/// Result of the gate for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateOutcome {
    pub admitted: bool,
    /// Oracle rating, when one was obtained.
    pub rating: Option<f64>,
    /// Set when the fallback policy decided instead of the oracle.
    pub fallback: Option<RelevanceFallback>,
}

#[derive(Default)]
pub struct RelevanceGate {
    oracle: Option<Arc<dyn IOracle>>,
    degradations: Option<SharedDegradations>,
}

impl RelevanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn IOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_degradations(mut self, tracker: SharedDegradations) -> Self {
        self.degradations = Some(tracker);
        self
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Decide whether `finding` is worth queueing for the session in `ctx`.
    pub async fn evaluate(
        &self,
        finding: &ResearchFinding,
        ctx: &SessionContext,
        static_score: f64,
        config: &InjectionConfig,
    ) -> GateOutcome {
        let timeout = Duration::from_secs(config.relevance_timeout_secs);
        match self.rate(finding, ctx, timeout).await {
            Some(rating) => GateOutcome {
                admitted: rating >= config.relevance_threshold,
                rating: Some(rating),
                fallback: None,
            },
            None => {
                let admitted = match config.relevance_fallback {
                    RelevanceFallback::StaticScore => static_score >= config.relevance_threshold,
                    RelevanceFallback::Admit => true,
                    RelevanceFallback::Reject => false,
                };
                GateOutcome {
                    admitted,
                    rating: None,
                    fallback: Some(config.relevance_fallback),
                }
            }
        }
    }

    /// Oracle rating in [0, 1], or `None` when there is no usable answer.
    pub async fn rate(
        &self,
        finding: &ResearchFinding,
        ctx: &SessionContext,
        timeout: Duration,
    ) -> Option<f64> {
        let oracle = self.oracle.as_ref()?;
        let prompt = relevance_prompt(finding, ctx);
        let reply = match tokio::time::timeout(timeout, oracle.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                self.degrade(&e.to_string());
                return None;
            }
            Err(_) => {
                self.degrade(&format!("timed out after {}s", timeout.as_secs()));
                return None;
            }
        };
        match parse_rating(&reply) {
            Some(rating) => {
                degradation::recovered(self.degradations.as_ref(), COMPONENT);
                debug!(finding_id = %finding.id, rating, "relevance rated");
                Some(rating)
            }
            None => {
                self.degrade("unparseable rating");
                None
            }
        }
    }

    fn degrade(&self, failure: &str) {
        degradation::report(
            self.degradations.as_ref(),
            COMPONENT,
            failure,
            "relevance_fallback",
        );
    }
}

fn relevance_prompt(finding: &ResearchFinding, ctx: &SessionContext) -> String {
    let mut out = String::with_capacity(1_024);
    out.push_str("A developer is in the middle of a coding session.\n");
    if let Some(task) = &ctx.current_task {
        let _ = writeln!(out, "Current task: {task}");
    }
    if let Some(area) = ctx.focus.current() {
        let _ = writeln!(out, "Focus: {area}");
    }
    if !ctx.tech_stack.is_empty() {
        let tech: Vec<&str> = ctx.tech_stack.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Tech stack: {}", tech.join(", "));
    }
    for err in ctx.recent_errors.iter().rev().take(RECENT_ERRORS) {
        let _ = writeln!(out, "Recent error ({}): {}", err.kind.as_str(), err.message);
    }
    let _ = write!(
        out,
        "\nResearch result\nQuery: {}\nSummary: {}\n\n\
         How useful is this result for the current task right now? \
         Reply with a single number between 0.0 and 1.0.",
        finding.query, finding.summary
    );
    out
}

/// Rating in [0, 1] from a free-text reply.
///
/// A bare number wins. Otherwise scale echoes ("from 0.0 to 1.0") are
/// dropped, then the last anchored number ("I rate this 0.9") is taken,
/// then the last number in range anywhere.
fn parse_rating(reply: &str) -> Option<f64> {
    let in_range = |v: &f64| (0.0..=1.0).contains(v);
    let trimmed = reply.trim().trim_end_matches('.');
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v).filter(in_range);
    }

    let without_scale = match RE_RANGE.as_ref() {
        Some(re) => re.replace_all(reply, " "),
        None => reply.into(),
    };
    let anchored = RE_ANCHORED.as_ref().and_then(|re| {
        re.captures_iter(&without_scale)
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
            .filter(in_range)
            .last()
    });
    anchored.or_else(|| {
        RE_NUMBER.as_ref()?
            .find_iter(&without_scale)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .filter(in_range)
            .last()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_is_read_from_free_text() {
        assert_eq!(parse_rating("0.82"), Some(0.82));
        assert_eq!(parse_rating(" 1\n"), Some(1.0));
        assert_eq!(parse_rating("7"), None);
        assert_eq!(parse_rating("Rating: 0.4."), Some(0.4));
        assert_eq!(parse_rating("I'd say 7 out of 10, so 0.7"), Some(0.7));
        assert_eq!(parse_rating("very relevant"), None);
    }

    #[test]
    fn echoed_scale_is_not_a_rating() {
        assert_eq!(
            parse_rating("On a scale from 0.0 to 1.0, I rate this 0.9"),
            Some(0.9)
        );
        assert_eq!(
            parse_rating("Between 0 and 1 I'd put it at 0.65 overall."),
            Some(0.65)
        );
        assert_eq!(
            parse_rating("Score: 0.3 (scale 0-1, 1 caveat noted)"),
            Some(0.3)
        );
        assert_eq!(parse_rating("A number between 0.0 and 1.0 is expected."), None);
    }
}
