//! Source reliability ledger updates.

use std::collections::BTreeSet;

use tracing::debug;

use scout_core::constants::GENERAL_TOPIC;
use scout_core::errors::ScoutResult;
use scout_core::models::{ResearchFinding, SourceQualityEntry};
use scout_core::traits::IResearchStorage;

fn topic_of(finding: &ResearchFinding) -> &str {
    finding.domain.as_deref().unwrap_or(GENERAL_TOPIC)
}

fn cited_domains(finding: &ResearchFinding) -> BTreeSet<&str> {
    finding
        .sources
        .iter()
        .map(|s| s.domain.as_str())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Record one citation for every distinct source domain of `finding`.
pub fn record_finding_citations(
    storage: &dyn IResearchStorage,
    finding: &ResearchFinding,
    helpful: bool,
) -> ScoutResult<Vec<SourceQualityEntry>> {
    let topic = topic_of(finding);
    let increment = if helpful { 1.0 } else { 0.0 };
    let domains = cited_domains(finding);

    let mut updated = Vec::with_capacity(domains.len());
    for domain in domains {
        let entry = storage.record_citation(domain, topic, increment)?;
        debug!(
            domain,
            topic,
            reliability = entry.reliability,
            citations = entry.citation_count,
            "source reliability updated"
        );
        updated.push(entry);
    }
    Ok(updated)
}

/// A re-scored injection flipped from unhelpful to helpful or back. Move the
/// helpful count of every cited domain without counting the citation again.
pub fn revise_finding_citations(
    storage: &dyn IResearchStorage,
    finding: &ResearchFinding,
    now_helpful: bool,
) -> ScoutResult<Vec<SourceQualityEntry>> {
    let topic = topic_of(finding);
    let delta = if now_helpful { 1.0 } else { -1.0 };

    let mut updated = Vec::new();
    for domain in cited_domains(finding) {
        if let Some(entry) = storage.adjust_helpful(domain, topic, delta)? {
            debug!(domain, topic, reliability = entry.reliability, "source reliability revised");
            updated.push(entry);
        }
    }
    Ok(updated)
}
