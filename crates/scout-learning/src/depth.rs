//! Research depth recommendation.
//!
//! Query shape decides by default. Once a domain has enough scored history,
//! the depth that worked best there wins instead.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use scout_core::config::LearningConfig;
use scout_core::models::{DepthOutcome, ResearchDepth};

static RE_DEFINITION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:what(?:'s| is| are)|define|meaning of|who is)\b").ok()
});
static RE_COMPARISON: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:vs\.?|versus|compare[ds]?|comparison|difference between|pros and cons|trade-?offs?|alternatives? to)\b",
    )
    .ok()
});
static RE_HOW_TO: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:how (?:do|can|should|to)|best way to|steps to|guide to)\b|\bhow to\b")
        .ok()
});

/// Definitions longer than this are not "short".
const SHORT_QUERY_WORDS: usize = 8;
/// How-tos longer than this go deep.
const LONG_QUERY_WORDS: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthRecommendation {
    pub depth: ResearchDepth,
    pub confidence: f64,
    pub reason: String,
}

impl DepthRecommendation {
    fn new(depth: ResearchDepth, confidence: f64, reason: &str) -> Self {
        Self {
            depth,
            confidence,
            reason: reason.to_string(),
        }
    }
}

fn matches(re: &LazyLock<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(text))
}

/// Depth from the query alone.
pub fn recommend_by_rules(query: &str) -> DepthRecommendation {
    let words = query.split_whitespace().count();

    if matches(&RE_DEFINITION, query) && words <= SHORT_QUERY_WORDS {
        return DepthRecommendation::new(ResearchDepth::Quick, 0.7, "short definition question");
    }
    if matches(&RE_COMPARISON, query) {
        return DepthRecommendation::new(ResearchDepth::Deep, 0.7, "comparison");
    }
    if matches(&RE_HOW_TO, query) {
        return if words > LONG_QUERY_WORDS {
            DepthRecommendation::new(ResearchDepth::Deep, 0.6, "long how-to")
        } else {
            DepthRecommendation::new(ResearchDepth::Medium, 0.6, "how-to")
        };
    }
    DepthRecommendation::new(ResearchDepth::Medium, 0.5, "default")
}

/// Best-performing depth for a domain, if history is conclusive.
pub fn empirical_depth(
    outcomes: &[DepthOutcome],
    config: &LearningConfig,
) -> Option<DepthRecommendation> {
    if outcomes.len() < config.min_depth_samples {
        return None;
    }

    let mut tally: BTreeMap<ResearchDepth, (usize, usize)> = BTreeMap::new();
    for outcome in outcomes {
        let (total, helpful) = tally.entry(outcome.depth).or_default();
        *total += 1;
        if outcome.helpful {
            *helpful += 1;
        }
    }

    tally
        .into_iter()
        .filter(|(_, (total, _))| *total >= config.min_samples_per_depth)
        .map(|(depth, (total, helpful))| (depth, helpful as f64 / total as f64))
        .filter(|(_, rate)| *rate > config.min_depth_success_rate)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(depth, rate)| DepthRecommendation {
            depth,
            confidence: rate,
            reason: format!("historical success rate {rate:.2}"),
        })
}
