//! Structured session digest sent to the oracle.

use std::fmt::Write;

use scout_session::{SessionContext, StuckIndicator};

/// Characters kept from each window entry.
const ENTRY_CHARS: usize = 400;
/// Prior research queries listed.
const PRIOR_RESEARCH: usize = 5;
/// Recent error signatures listed.
const RECENT_ERRORS: usize = 5;

const INSTRUCTIONS: &str = "\
You decide whether external research would help the developer in this coding session.
Reply with a single JSON object and nothing else:
{\"should_research\": bool, \"research_type\": \"direct\" | \"alternative\" | \"validation\",
 \"query\": string, \"confidence\": number 0-1, \"priority\": integer 1-10,
 \"depth\": \"quick\" | \"medium\" | \"deep\", \"reasoning\": string}
Research only when the developer is blocked, unsure, or using an API that may have changed.
Do not repeat prior research.";

/// Render the digest for one analysis.
pub fn build_prompt(
    ctx: &SessionContext,
    stuck: &StuckIndicator,
    suggestions: &[String],
    entries: usize,
) -> String {
    let mut out = String::with_capacity(4_096);
    out.push_str(INSTRUCTIONS);
    out.push_str("\n\n## Session\n");

    let _ = writeln!(
        out,
        "Current task: {}",
        ctx.current_task.as_deref().unwrap_or("unknown")
    );
    if let Some(path) = &ctx.project_path {
        let _ = writeln!(out, "Project: {path}");
    }
    let _ = writeln!(out, "Topics: {}", join_or_none(ctx.topics.iter()));
    let _ = writeln!(out, "Tech stack: {}", join_or_none(ctx.tech_stack.iter()));

    if !suggestions.is_empty() {
        let _ = writeln!(out, "Strategic context: {}", suggestions.join("; "));
    }
    if stuck.is_stuck {
        let _ = writeln!(
            out,
            "Stuck: {} consecutive tool uses on {}",
            stuck.turns,
            stuck.focus_area.as_deref().unwrap_or("the same area")
        );
    }

    if !ctx.recent_errors.is_empty() {
        out.push_str("\n## Recent errors\n");
        let skip = ctx.recent_errors.len().saturating_sub(RECENT_ERRORS);
        for err in ctx.recent_errors.iter().skip(skip) {
            let _ = writeln!(out, "- [{}] {}", err.kind.as_str(), err.message);
        }
    }

    if !ctx.research_history.is_empty() {
        out.push_str("\n## Prior research\n");
        let skip = ctx.research_history.len().saturating_sub(PRIOR_RESEARCH);
        for r in ctx.research_history.iter().skip(skip) {
            let _ = writeln!(
                out,
                "- {}{}",
                r.query,
                if r.injected { " (delivered)" } else { "" }
            );
        }
    }

    out.push_str("\n## Recent activity\n");
    for entry in ctx.recent_entries(entries) {
        let rendered = entry.render();
        let clipped: String = rendered.chars().take(ENTRY_CHARS).collect();
        let _ = writeln!(out, "{clipped}");
    }
    out
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn digest_lists_task_stuck_and_recent_entries_only() {
        let mut ctx = SessionContext::new("s1", Some("/work".into()), Utc::now());
        ctx.current_task = Some("fix login".into());
        ctx.tech_stack.insert("express".into());
        for i in 0..12 {
            ctx.window
                .push_back(scout_session::ConversationEntry::user_prompt(&format!("p{i}")));
        }
        let stuck = StuckIndicator {
            is_stuck: true,
            focus_area: Some("auth.ts".into()),
            turns: 9,
        };
        let prompt = build_prompt(&ctx, &stuck, &["auth best practices".into()], 8);

        assert!(prompt.contains("Current task: fix login"));
        assert!(prompt.contains("Tech stack: express"));
        assert!(prompt.contains("Stuck: 9 consecutive tool uses on auth.ts"));
        assert!(prompt.contains("Strategic context: auth best practices"));
        assert!(prompt.contains("[user] p11"));
        assert!(prompt.contains("[user] p4"));
        assert!(!prompt.contains("[user] p3\n"));
    }
}
