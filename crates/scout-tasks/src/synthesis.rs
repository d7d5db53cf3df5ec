//! Turn a ranked result pool into a `ResearchFinding`.
//!
//! The oracle writes the summary and tiered key points when it is available
//! and enabled. Any oracle failure, or a reply without a usable summary, falls
//! back to extractive synthesis over the fetched pages.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use scout_core::models::{FindingSource, KeyPoint, ResearchFinding, ResearchTask};
use scout_core::traits::IOracle;
use scout_observability::degradation::{self, SharedDegradations};
use scout_session::extraction::primary_domain;

use crate::extractive::{summarize, top_sentences};
use crate::ranking::RankedResult;

const MAX_SOURCES: usize = 8;
const MAX_FULL_CONTENT_CHARS: usize = 24_000;
/// Page text shown to the oracle per source.
const PROMPT_EXCERPT_CHARS: usize = 1_500;
const SUMMARY_SENTENCES: usize = 2;
const KEY_POINTS: usize = 6;
const ORACLE_CONFIDENCE: f64 = 0.7;
const SYNTHESIS_COMPONENT: &str = "synthesis_oracle";

/// Page text by normalized URL.
pub type Pages = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct SynthesisReply {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<ReplyPoint>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyPoint {
    Text(String),
    Tiered { text: String, tier: Option<u8> },
}

pub struct Synthesizer {
    oracle: Option<Arc<dyn IOracle>>,
    enabled: AtomicBool,
    degradations: Option<SharedDegradations>,
}

impl Synthesizer {
    /// Extractive only.
    pub fn extractive() -> Self {
        Self {
            oracle: None,
            enabled: AtomicBool::new(false),
            degradations: None,
        }
    }

    pub fn with_oracle(oracle: Arc<dyn IOracle>, enabled: bool) -> Self {
        Self {
            oracle: Some(oracle),
            enabled: AtomicBool::new(enabled),
            degradations: None,
        }
    }

    pub fn with_degradations(mut self, tracker: SharedDegradations) -> Self {
        self.degradations = Some(tracker);
        self
    }

    pub fn set_oracle_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub async fn synthesize(
        &self,
        task: &ResearchTask,
        ranked: &[RankedResult],
        pages: &Pages,
    ) -> ResearchFinding {
        let top = &ranked[..ranked.len().min(MAX_SOURCES)];
        let mut finding = base_finding(task, top, pages);

        let oracle = self
            .oracle
            .as_ref()
            .filter(|_| self.enabled.load(Ordering::Relaxed));
        if let Some(oracle) = oracle {
            let prompt = synthesis_prompt(task, top, pages);
            match oracle.complete(&prompt).await {
                Ok(reply) => match parse_reply(&reply) {
                    Some(parsed) => {
                        degradation::recovered(self.degradations.as_ref(), SYNTHESIS_COMPONENT);
                        apply_reply(&mut finding, parsed);
                        return finding;
                    }
                    None => self.degrade("malformed reply"),
                },
                Err(e) => self.degrade(&e.to_string()),
            }
        }

        extractive_fill(&mut finding, top, pages);
        finding
    }

    fn degrade(&self, failure: &str) {
        degradation::report(
            self.degradations.as_ref(),
            SYNTHESIS_COMPONENT,
            failure,
            "extractive",
        );
    }
}

fn base_finding(task: &ResearchTask, top: &[RankedResult], pages: &Pages) -> ResearchFinding {
    let now = Utc::now();
    let domain_text = match &task.context {
        Some(ctx) => format!("{} {ctx}", task.query),
        None => task.query.clone(),
    };
    ResearchFinding {
        id: uuid::Uuid::new_v4().to_string(),
        task_id: Some(task.id.clone()),
        query: task.query.clone(),
        summary: String::new(),
        key_points: Vec::new(),
        full_content: full_content(top, pages),
        sources: top
            .iter()
            .map(|r| FindingSource {
                title: r.title.clone(),
                url: r.url.clone(),
                domain: r.domain.clone(),
                quality: r.score,
                adapter: r.adapters.first().cloned().unwrap_or_default(),
            })
            .collect(),
        domain: primary_domain(&domain_text).map(str::to_string),
        depth: task.depth,
        confidence: 0.0,
        created_at: now,
        last_accessed: now,
        project_path: task.project_path.clone(),
    }
}

fn page_or_snippet<'a>(r: &'a RankedResult, pages: &'a Pages) -> &'a str {
    pages
        .get(&r.normalized_url)
        .map(String::as_str)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(&r.snippet)
}

fn full_content(top: &[RankedResult], pages: &Pages) -> String {
    let mut out = String::new();
    for r in top {
        let _ = write!(out, "## {}\n{}\n\n{}\n\n", r.title, r.url, page_or_snippet(r, pages));
        if out.len() >= MAX_FULL_CONTENT_CHARS {
            break;
        }
    }
    truncate_chars(out.trim_end(), MAX_FULL_CONTENT_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn synthesis_prompt(task: &ResearchTask, top: &[RankedResult], pages: &Pages) -> String {
    let mut out = String::with_capacity(8_192);
    out.push_str("Synthesize research results for a developer in the middle of a coding task.\n");
    let _ = writeln!(out, "Query: {}", task.query);
    if let Some(ctx) = &task.context {
        let _ = writeln!(out, "Context: {ctx}");
    }
    out.push_str("\nSources:\n");
    for (i, r) in top.iter().enumerate() {
        let _ = writeln!(out, "[{}] {} ({})", i + 1, r.title, r.url);
        let excerpt = truncate_chars(page_or_snippet(r, pages), PROMPT_EXCERPT_CHARS);
        let _ = writeln!(out, "{excerpt}\n");
    }
    out.push_str(
        "Reply with a single JSON object and nothing else:\n\
         {\"summary\": string of at most three sentences,\n \
         \"key_points\": [{\"text\": string, \"tier\": 1 | 2 | 3}],\n \
         \"confidence\": number 0-1}\n\
         Tier 1 points are the ones the developer must know first.",
    );
    out
}

fn parse_reply(reply: &str) -> Option<SynthesisReply> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: SynthesisReply = serde_json::from_str(&reply[start..=end]).ok()?;
    (!parsed.summary.trim().is_empty()).then_some(parsed)
}

fn apply_reply(finding: &mut ResearchFinding, reply: SynthesisReply) {
    finding.summary = reply.summary.trim().to_string();
    finding.key_points = reply
        .key_points
        .into_iter()
        .map(|p| match p {
            ReplyPoint::Text(text) => KeyPoint::new(text, 2),
            ReplyPoint::Tiered { text, tier } => KeyPoint::new(text, tier.unwrap_or(2).clamp(1, 3)),
        })
        .filter(|p| !p.text.trim().is_empty())
        .collect();
    finding.key_points.sort_by_key(|p| p.tier);
    finding.confidence = reply
        .confidence
        .unwrap_or(ORACLE_CONFIDENCE)
        .clamp(0.0, 1.0);
    debug!(finding_id = %finding.id, points = finding.key_points.len(), "oracle synthesis");
}

/// Summary and key points from the page text alone.
fn extractive_fill(finding: &mut ResearchFinding, top: &[RankedResult], pages: &Pages) {
    let corpus = top
        .iter()
        .map(|r| page_or_snippet(r, pages))
        .collect::<Vec<_>>()
        .join("\n\n");

    let lead = top.first().map(|r| page_or_snippet(r, pages)).unwrap_or_default();
    finding.summary = summarize(lead, SUMMARY_SENTENCES);
    if finding.summary.is_empty() {
        finding.summary = summarize(&corpus, SUMMARY_SENTENCES);
    }
    if finding.summary.is_empty() {
        warn!(finding_id = %finding.id, "no extractable sentences, using titles");
        finding.summary = top
            .iter()
            .take(3)
            .map(|r| r.title.as_str())
            .collect::<Vec<_>>()
            .join("; ");
    }

    finding.key_points = top_sentences(&corpus, KEY_POINTS)
        .into_iter()
        .enumerate()
        .map(|(i, text)| KeyPoint::new(text, (i / 2 + 1).min(3) as u8))
        .collect();

    let mean_score = if top.is_empty() {
        0.0
    } else {
        top.iter().map(|r| r.score).sum::<f64>() / top.len() as f64
    };
    finding.confidence = (0.3 + 0.1 * top.len().min(3) as f64 + 0.2 * mean_score).min(0.8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::models::{ResearchDepth, ResearchRequest, TriggerSource};

    fn ranked(url: &str, score: f64) -> RankedResult {
        RankedResult {
            title: format!("Title {url}"),
            url: url.to_string(),
            normalized_url: url.to_string(),
            domain: "docs.rs".to_string(),
            snippet: "Tokio timers are driven by the runtime clock.".into(),
            adapters: vec!["docs".to_string()],
            relevance: 0.8,
            reliability: 0.5,
            score,
        }
    }

    fn task() -> ResearchTask {
        ResearchTask::from_request(&ResearchRequest::new(
            "tokio interval timer drift",
            ResearchDepth::Quick,
            TriggerSource::Manual,
        ))
    }

    #[test]
    fn reply_accepts_plain_and_tiered_points() {
        let reply = r#"ok {"summary": "Use interval_at.",
            "key_points": ["a", {"text": "b", "tier": 1}], "confidence": 1.4}"#;
        let parsed = parse_reply(reply).unwrap();
        let top = [ranked("https://docs.rs/x", 0.7)];
        let mut finding = base_finding(&task(), &top, &Pages::new());
        apply_reply(&mut finding, parsed);
        assert_eq!(finding.key_points[0].text, "b");
        assert_eq!(finding.key_points[0].tier, 1);
        assert!((finding.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_not_a_reply() {
        assert!(parse_reply(r#"{"summary": "  "}"#).is_none());
        assert!(parse_reply("no json here").is_none());
    }

    #[tokio::test]
    async fn extractive_uses_page_text_over_snippet() {
        let mut pages = Pages::new();
        pages.insert(
            "https://docs.rs/x".to_string(),
            "Missed ticks are bursted by default in tokio intervals. \
             Set MissedTickBehavior::Delay to avoid bursts after a stall."
                .to_string(),
        );
        let finding = Synthesizer::extractive()
            .synthesize(&task(), &[ranked("https://docs.rs/x", 0.7)], &pages)
            .await;
        assert!(finding.summary.contains("Missed ticks"));
        assert!(finding.full_content.contains("MissedTickBehavior"));
        assert_eq!(finding.sources.len(), 1);
        assert!(finding.confidence > 0.0 && finding.confidence <= 0.8);
    }
}
