//! Zero-latency analysis of the latest tool output.

use scout_core::models::TriggerDecision;
use scout_session::ConversationEntry;

use crate::rules::all_rules;

/// Longest query taken from a matched error line.
const MAX_QUERY_CHARS: usize = 200;

/// Check only the latest entry, and only if it is a tool use.
/// `None` when nothing in the table matches.
pub fn quick_analyze(entries: &[&ConversationEntry]) -> Option<TriggerDecision> {
    let latest = entries.last()?;
    if !latest.is_tool_use() {
        return None;
    }

    all_rules().into_iter().find_map(|rule| {
        let m = rule.regex.as_ref()?.find(&latest.content)?;
        let query: String = m.as_str().trim().chars().take(MAX_QUERY_CHARS).collect();
        Some(TriggerDecision {
            should_research: true,
            research_type: rule.research_type,
            query: Some(query),
            confidence: rule.confidence,
            priority: rule.priority,
            reasoning: format!("matched {} pattern in {} output", rule.name, tool_label(latest)),
            depth: None,
            source: rule.source,
        })
    })
}

fn tool_label(entry: &ConversationEntry) -> &str {
    entry.tool_name.as_deref().unwrap_or("tool")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::models::{ResearchType, TriggerSource};
    use scout_session::ToolUseEvent;

    fn tool_entry(output: &str) -> ConversationEntry {
        ConversationEntry::tool_use(
            &ToolUseEvent {
                session_id: "s".into(),
                tool_name: "Bash".into(),
                input: serde_json::json!({"command": "npm test"}),
                output: output.into(),
                is_error: true,
                project_path: None,
            },
            2_000,
        )
    }

    #[test]
    fn undefined_property_is_direct() {
        let entry = tool_entry(
            "    at render (App.tsx:12)\nTypeError: Cannot read properties of undefined (reading 'map')\n",
        );
        let decision = quick_analyze(&[&entry]).unwrap();
        assert!(decision.should_research);
        assert_eq!(decision.research_type, ResearchType::Direct);
        assert!((decision.confidence - 0.6).abs() < 1e-9);
        assert_eq!(decision.priority, 7);
        assert_eq!(decision.source, TriggerSource::ToolError);
        assert_eq!(
            decision.query.as_deref(),
            Some("TypeError: Cannot read properties of undefined (reading 'map')")
        );
    }

    #[test]
    fn deprecation_is_validation() {
        let entry = tool_entry("(node:42) [DEP0005] DeprecationWarning: Buffer() is deprecated");
        let decision = quick_analyze(&[&entry]).unwrap();
        assert_eq!(decision.research_type, ResearchType::Validation);
        assert!((decision.confidence - 0.5).abs() < 1e-9);
        assert_eq!(decision.priority, 5);
        assert_eq!(decision.source, TriggerSource::Deprecation);
    }

    #[test]
    fn error_wins_over_deprecation() {
        let entry = tool_entry("DeprecationWarning: x\nReferenceError: foo is not defined");
        let decision = quick_analyze(&[&entry]).unwrap();
        assert_eq!(decision.research_type, ResearchType::Direct);
    }

    #[test]
    fn only_latest_tool_entry_counts() {
        let error = tool_entry("TypeError: Cannot read properties of null (reading 'x')");
        let clean = tool_entry("all tests passed");
        assert!(quick_analyze(&[&error, &clean]).is_none());

        let prompt = ConversationEntry::user_prompt("TypeError: Cannot read properties of null");
        assert!(quick_analyze(&[&error, &prompt]).is_none());
        assert!(quick_analyze(&[]).is_none());
    }
}
