use super::{rule_pattern, Rule};

rule_pattern!(
    RE_IMPERATIVE,
    r"(?i)^\s*(?:please\s+)?((?:implement|add|fix|create|build|refactor|write|update|migrate|debug|optimi[sz]e|remove|replace|set up|setup|port|convert)\b[^.!?\n]{3,120})"
);
rule_pattern!(
    RE_INTENT,
    r"(?i)\b(?:i need to|i want to|we need to|let's|lets|can you|could you|help me(?: to)?)\s+((?:implement|add|fix|create|build|refactor|write|update|migrate|debug|optimi[sz]e|remove|replace|set up|setup|port|convert)\b[^.!?\n]{3,120})"
);

/// Task phrase patterns, tried in order; the first capture wins.
pub fn all_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "imperative",
            regex: &RE_IMPERATIVE,
        },
        Rule {
            name: "intent",
            regex: &RE_INTENT,
        },
    ]
}

/// The task a user prompt asks for, if it reads as one.
pub fn detect_task(prompt: &str) -> Option<String> {
    all_rules().iter().find_map(|rule| {
        let re = rule.regex.as_ref()?;
        let caps = re.captures(prompt)?;
        let task = caps.get(1)?.as_str().trim().trim_end_matches([',', ';', ':']);
        (!task.is_empty()).then(|| task.to_string())
    })
}

/// Tool input fields that carry a free-text description of the work, as
/// written by agent, todo and planning tools.
const TASK_FIELDS: &[&str] = &["description", "prompt", "task", "subject", "title"];

/// The task a tool use describes in its input, if any. Commands and paths
/// are never read as tasks.
pub fn detect_task_in_input(input: &serde_json::Value) -> Option<String> {
    let fields = input.as_object()?;
    TASK_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key)?.as_str())
        .find_map(detect_task)
}
