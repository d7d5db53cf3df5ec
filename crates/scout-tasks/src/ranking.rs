//! Merge adapter results by normalized URL and rank the pool.

use std::collections::HashMap;

use scout_core::models::SearchResult;
use scout_storage::cache::{domain_of, normalize_url};

/// Relevance assumed for adapters that report none.
const DEFAULT_RELEVANCE: f64 = 0.5;
/// Reliability assumed for a domain with no ledger entry.
pub const UNKNOWN_RELIABILITY: f64 = 0.5;

const W_RELEVANCE: f64 = 0.6;
const W_RELIABILITY: f64 = 0.3;
const W_AGREEMENT: f64 = 0.1;

/// One URL after merging, with every adapter that returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub title: String,
    pub url: String,
    pub normalized_url: String,
    pub domain: String,
    pub snippet: String,
    /// Adapters that returned this URL, in arrival order.
    pub adapters: Vec<String>,
    pub relevance: f64,
    pub reliability: f64,
    pub score: f64,
}

/// Collapse duplicates across adapters. The highest-relevance copy keeps its
/// title and snippet; result order follows first arrival.
pub fn merge_results(results: Vec<SearchResult>) -> Vec<RankedResult> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, RankedResult> = HashMap::new();

    for r in results {
        if r.url.trim().is_empty() {
            continue;
        }
        let key = normalize_url(&r.url);
        let relevance = r.relevance.unwrap_or(DEFAULT_RELEVANCE).clamp(0.0, 1.0);
        match merged.get_mut(&key) {
            Some(existing) => {
                if !existing.adapters.contains(&r.source) {
                    existing.adapters.push(r.source.clone());
                }
                if relevance > existing.relevance {
                    existing.relevance = relevance;
                    existing.title = r.title;
                    existing.snippet = r.snippet;
                }
            }
            None => {
                order.push(key.clone());
                merged.insert(
                    key.clone(),
                    RankedResult {
                        domain: domain_of(&r.url).unwrap_or_default(),
                        title: r.title,
                        url: r.url,
                        normalized_url: key,
                        snippet: r.snippet,
                        adapters: vec![r.source],
                        relevance,
                        reliability: UNKNOWN_RELIABILITY,
                        score: 0.0,
                    },
                );
            }
        }
    }
    order
        .into_iter()
        .filter_map(|k| merged.remove(&k))
        .collect()
}

/// Score each result from relevance, domain reliability and cross-adapter
/// agreement, then sort best first. Ties keep arrival order.
pub fn rank(
    mut pool: Vec<RankedResult>,
    reliability: impl Fn(&str) -> Option<f64>,
) -> Vec<RankedResult> {
    for r in &mut pool {
        r.reliability = reliability(&r.domain).unwrap_or(UNKNOWN_RELIABILITY);
        let agreement = ((r.adapters.len() as f64 - 1.0) / 2.0).clamp(0.0, 1.0);
        r.score = (W_RELEVANCE * r.relevance
            + W_RELIABILITY * r.reliability
            + W_AGREEMENT * agreement)
            .clamp(0.0, 1.0);
    }
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));
    pool
}
