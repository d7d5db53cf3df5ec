//! Per-session set of queries currently executing.

use std::collections::BTreeSet;

use dashmap::DashMap;

use crate::lexical::{jaccard, normalize_query, significant_words};

#[derive(Debug, Clone)]
struct Claim {
    normalized: String,
    words: BTreeSet<String>,
}

#[derive(Default)]
pub struct InflightGuard {
    claims: DashMap<String, Vec<Claim>>,
}

impl InflightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The executing query `query` collides with, and the similarity, if any.
    /// Identical normalized forms always collide.
    pub fn conflict(&self, session_id: &str, query: &str, threshold: f64) -> Option<(String, f64)> {
        let normalized = normalize_query(query);
        let words = significant_words(query);
        let claims = self.claims.get(session_id)?;
        claims.iter().find_map(|c| {
            if c.normalized == normalized {
                return Some((c.normalized.clone(), 1.0));
            }
            let sim = jaccard(&c.words, &words);
            (sim > threshold).then(|| (c.normalized.clone(), sim))
        })
    }

    /// Claim `query` for `session_id`. False if a conflicting claim exists.
    pub fn try_claim(&self, session_id: &str, query: &str, threshold: f64) -> bool {
        let normalized = normalize_query(query);
        let words = significant_words(query);
        let mut claims = self.claims.entry(session_id.to_string()).or_default();
        let collides = claims
            .iter()
            .any(|c| c.normalized == normalized || jaccard(&c.words, &words) > threshold);
        if collides {
            return false;
        }
        claims.push(Claim { normalized, words });
        true
    }

    pub fn release(&self, session_id: &str, query: &str) {
        let normalized = normalize_query(query);
        let now_empty = match self.claims.get_mut(session_id) {
            Some(mut claims) => {
                if let Some(pos) = claims.iter().position(|c| c.normalized == normalized) {
                    claims.remove(pos);
                }
                claims.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.claims.remove_if(session_id, |_, claims| claims.is_empty());
        }
    }

    pub fn count(&self, session_id: &str) -> usize {
        self.claims.get(session_id).map(|c| c.len()).unwrap_or(0)
    }
}
