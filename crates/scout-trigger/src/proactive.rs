//! Triggers that fire without an error: a stuck focus, or a due strategic
//! analysis with something worth suggesting.

use scout_core::models::{ResearchType, TriggerDecision, TriggerSource};
use scout_session::{SessionContext, StuckIndicator};

/// Stuck beats strategic. `None` when neither applies.
pub fn proactive_decision(
    ctx: &SessionContext,
    stuck: &StuckIndicator,
    strategic_due: bool,
    suggestions: &[String],
) -> Option<TriggerDecision> {
    if stuck.is_stuck {
        let subject = ctx
            .current_task
            .clone()
            .or_else(|| stuck.focus_area.clone())
            .unwrap_or_else(|| "the current approach".to_string());
        let query = match ctx.tech_stack.iter().next() {
            Some(tech) => format!("alternative approaches to {subject} in {tech}"),
            None => format!("alternative approaches to {subject}"),
        };
        return Some(TriggerDecision {
            should_research: true,
            research_type: ResearchType::Alternative,
            query: Some(query),
            confidence: 0.7,
            priority: 6,
            reasoning: format!(
                "stuck: {} consecutive tool uses on {}",
                stuck.turns,
                stuck.focus_area.as_deref().unwrap_or("one area")
            ),
            depth: None,
            source: TriggerSource::Stuck,
        });
    }

    if strategic_due {
        let suggestion = suggestions.first()?;
        return Some(TriggerDecision {
            should_research: true,
            research_type: ResearchType::Validation,
            query: Some(suggestion.clone()),
            confidence: 0.5,
            priority: 4,
            reasoning: "strategic analysis: complementary research".to_string(),
            depth: None,
            source: TriggerSource::Strategic,
        });
    }
    None
}
