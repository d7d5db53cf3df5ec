//! Delimited injection blocks.
//!
//! Level 1 carries the summary, level 2 adds key points, level 3 adds the full
//! content. Every block names the query, cites up to `max_citations` sources,
//! and ends with a pointer for requesting the next level by finding id.

use std::fmt::Write;

use scout_core::constants::{INJECTION_BLOCK_END, INJECTION_BLOCK_START};
use scout_core::models::{
    DisclosureLevel, FindingSource, KeyPoint, PendingInjection, ResearchFinding,
};
use scout_tokens::TokenCounter;

/// Truncation retries when token boundaries merge across lines.
const FIT_ATTEMPTS: usize = 4;

struct BlockParts<'a> {
    query: &'a str,
    summary: &'a str,
    key_points: &'a [KeyPoint],
    full_content: &'a str,
    pivot: Option<&'a str>,
    sources: &'a [FindingSource],
    finding_id: Option<&'a str>,
    level: DisclosureLevel,
    max_citations: usize,
}

fn compose(p: &BlockParts<'_>) -> String {
    let mut out = String::with_capacity(512);
    let _ = writeln!(out, "{INJECTION_BLOCK_START}");
    let _ = writeln!(out, "Research: {}", p.query);
    let _ = writeln!(out, "Summary: {}", p.summary.trim());

    if p.level >= DisclosureLevel::KeyPoints && !p.key_points.is_empty() {
        out.push_str("Key points:\n");
        for kp in p.key_points {
            let _ = writeln!(out, "- {}", kp.text);
        }
    }
    if p.level >= DisclosureLevel::Full && !p.full_content.trim().is_empty() {
        let _ = writeln!(out, "Details:\n{}", p.full_content.trim());
    }
    if let Some(pivot) = p.pivot {
        let _ = writeln!(out, "Pivot: {pivot}");
    }

    let cited: Vec<&FindingSource> = p.sources.iter().take(p.max_citations).collect();
    if !cited.is_empty() {
        out.push_str("Sources:\n");
        for (i, s) in cited.iter().enumerate() {
            let _ = writeln!(out, "[{}] {} ({})", i + 1, s.title, s.url);
        }
    }
    if let Some(id) = p.finding_id {
        if p.level < DisclosureLevel::Full {
            let _ = writeln!(
                out,
                "More: request finding {id} at level {}",
                p.level.next().as_u8()
            );
        }
    }
    out.push_str(INJECTION_BLOCK_END);
    out
}

fn parts<'a>(
    pending: &'a PendingInjection,
    finding: Option<&'a ResearchFinding>,
    level: DisclosureLevel,
    max_citations: usize,
) -> BlockParts<'a> {
    BlockParts {
        query: &pending.query,
        summary: &pending.summary,
        key_points: finding.map_or(&[][..], |f| f.key_points.as_slice()),
        full_content: finding.map_or("", |f| f.full_content.as_str()),
        pivot: pending.pivot.as_deref(),
        sources: &pending.sources,
        finding_id: pending.finding_id.as_deref(),
        // Without the finding there is nothing beyond the summary.
        level: if finding.is_some() {
            level
        } else {
            DisclosureLevel::Summary
        },
        max_citations,
    }
}

/// Render a pending injection at `level` without a token limit.
pub fn render_block(
    pending: &PendingInjection,
    finding: Option<&ResearchFinding>,
    level: DisclosureLevel,
    max_citations: usize,
) -> String {
    compose(&parts(pending, finding, level, max_citations))
}

/// The richest rendering of `pending` at or below `level` that fits
/// `allowance` tokens. At level 1 the summary is truncated to make room.
/// Returns the block, the level it was rendered at, and its token count.
pub fn fit_block(
    counter: &TokenCounter,
    pending: &PendingInjection,
    finding: Option<&ResearchFinding>,
    level: DisclosureLevel,
    max_citations: usize,
    allowance: usize,
) -> Option<(String, DisclosureLevel, usize)> {
    let mut current = level;
    loop {
        let p = parts(pending, finding, current, max_citations);
        let text = compose(&p);
        let tokens = counter.count_cached(&text);
        if tokens <= allowance {
            return Some((text, p.level, tokens));
        }
        if current == DisclosureLevel::Summary {
            break;
        }
        current = DisclosureLevel::from_u8(current.as_u8() - 1);
    }

    let base = parts(pending, finding, DisclosureLevel::Summary, max_citations);
    let overhead = counter.count(&compose(&BlockParts { summary: "", ..base }));
    let mut room = allowance.checked_sub(overhead)?;
    for _ in 0..FIT_ATTEMPTS {
        if room == 0 {
            return None;
        }
        let summary = counter.truncate(&pending.summary, room);
        let text = compose(&BlockParts {
            summary: &summary,
            ..base
        });
        let tokens = counter.count(&text);
        if tokens <= allowance {
            return Some((text, DisclosureLevel::Summary, tokens));
        }
        room = room.saturating_sub(tokens - allowance);
    }
    None
}

/// Render a stored finding at `level`, for explicit detail requests.
pub fn render_detail(
    finding: &ResearchFinding,
    level: DisclosureLevel,
    max_citations: usize,
) -> String {
    compose(&BlockParts {
        query: &finding.query,
        summary: &finding.summary,
        key_points: &finding.key_points,
        full_content: &finding.full_content,
        pivot: None,
        sources: &finding.sources,
        finding_id: Some(&finding.id),
        level,
        max_citations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scout_core::models::ResearchDepth;

    fn source(i: usize) -> FindingSource {
        FindingSource {
            title: format!("Source {i}"),
            url: format!("https://docs.rs/page{i}"),
            domain: "docs.rs".into(),
            quality: 0.7,
            adapter: "docs".into(),
        }
    }

    fn finding() -> ResearchFinding {
        ResearchFinding {
            id: "f-42".into(),
            task_id: Some("t1".into()),
            query: "tokio select cancellation".into(),
            summary: "Branches that lose a select! are dropped at their await point.".into(),
            key_points: vec![
                KeyPoint::new("Only cancellation-safe futures belong in a loop select!", 1),
                KeyPoint::new("Pin long-lived futures outside the loop", 2),
            ],
            full_content: "Long page text about cancellation safety.".into(),
            sources: (1..=5).map(source).collect(),
            domain: Some("rust".into()),
            depth: ResearchDepth::Medium,
            confidence: 0.7,
            created_at: Utc::now(),
            last_accessed: Utc::now(),
            project_path: None,
        }
    }

    fn pending(f: &ResearchFinding) -> PendingInjection {
        PendingInjection {
            query: f.query.clone(),
            summary: f.summary.clone(),
            relevance: 0.8,
            priority: 7,
            queued_at: Utc::now(),
            pivot: Some("Try a cancellation-safe channel recv instead".into()),
            finding_id: Some(f.id.clone()),
            task_id: f.task_id.clone(),
            sources: f.sources.clone(),
        }
    }

    #[test]
    fn summary_block_is_delimited_with_three_citations() {
        let f = finding();
        let block = render_block(&pending(&f), Some(&f), DisclosureLevel::Summary, 3);
        assert!(block.starts_with(INJECTION_BLOCK_START));
        assert!(block.ends_with(INJECTION_BLOCK_END));
        assert!(block.contains("Research: tokio select cancellation"));
        assert!(block.contains("[3] Source 3"));
        assert!(!block.contains("[4]"));
        assert!(block.contains("Pivot: Try a cancellation-safe"));
        assert!(block.contains("request finding f-42 at level 2"));
        assert!(!block.contains("Key points"));
    }

    #[test]
    fn higher_levels_add_key_points_then_details() {
        let f = finding();
        let p = pending(&f);
        let two = render_block(&p, Some(&f), DisclosureLevel::KeyPoints, 3);
        assert!(two.contains("- Only cancellation-safe futures"));
        assert!(!two.contains("Details:"));
        let three = render_block(&p, Some(&f), DisclosureLevel::Full, 3);
        assert!(three.contains("Details:\nLong page text"));
        assert!(!three.contains("More:"));
    }

    #[test]
    fn fit_steps_down_levels_then_truncates() {
        let counter = TokenCounter::default();
        let mut f = finding();
        f.full_content = "word ".repeat(2_000);
        let p = pending(&f);

        let (_, level, tokens) =
            fit_block(&counter, &p, Some(&f), DisclosureLevel::Full, 3, 400).unwrap();
        assert_eq!(level, DisclosureLevel::KeyPoints);
        assert!(tokens <= 400);

        let mut long = p.clone();
        long.summary = "Cancellation drops the losing branch. ".repeat(100);
        let (text, level, tokens) =
            fit_block(&counter, &long, Some(&f), DisclosureLevel::Summary, 3, 150).unwrap();
        assert_eq!(level, DisclosureLevel::Summary);
        assert!(tokens <= 150);
        assert!(text.ends_with(INJECTION_BLOCK_END));
    }

    #[test]
    fn nothing_fits_a_tiny_allowance() {
        let counter = TokenCounter::default();
        let f = finding();
        assert!(fit_block(&counter, &pending(&f), Some(&f), DisclosureLevel::Summary, 3, 5)
            .is_none());
    }

    #[test]
    fn detail_renders_requested_level() {
        let block = render_detail(&finding(), DisclosureLevel::Full, 3);
        assert!(block.contains("Key points:"));
        assert!(block.contains("Details:"));
    }
}
