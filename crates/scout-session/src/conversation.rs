//! Conversation window entries and the host events that produce them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user prompt from the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPromptEvent {
    pub session_id: String,
    pub prompt: String,
    pub project_path: Option<String>,
}

/// A completed tool invocation from the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUseEvent {
    pub session_id: String,
    pub tool_name: String,
    /// Raw tool input, usually a JSON object.
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub output: String,
    /// Host-reported failure.
    #[serde(default)]
    pub is_error: bool,
    pub project_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    UserPrompt,
    ToolUse,
}

/// One window entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub kind: EntryKind,
    pub tool_name: Option<String>,
    /// Compact rendering of the tool input.
    pub input_summary: Option<String>,
    /// Prompt text or (possibly truncated) tool output.
    pub content: String,
    pub truncated: bool,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn user_prompt(content: &str) -> Self {
        Self {
            kind: EntryKind::UserPrompt,
            tool_name: None,
            input_summary: None,
            content: content.to_string(),
            truncated: false,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Build a tool-use entry, cutting the output to `max_chars` characters.
    pub fn tool_use(event: &ToolUseEvent, max_chars: usize) -> Self {
        let (content, truncated) = truncate_chars(&event.output, max_chars);
        Self {
            kind: EntryKind::ToolUse,
            tool_name: Some(event.tool_name.clone()),
            input_summary: summarize_input(&event.input),
            content,
            truncated,
            is_error: event.is_error,
            timestamp: Utc::now(),
        }
    }

    pub fn is_tool_use(&self) -> bool {
        self.kind == EntryKind::ToolUse
    }

    /// Text used for fingerprints and digests.
    pub fn render(&self) -> String {
        match self.kind {
            EntryKind::UserPrompt => format!("[user] {}", self.content),
            EntryKind::ToolUse => format!(
                "[{}{}] {}{}",
                self.tool_name.as_deref().unwrap_or("tool"),
                if self.is_error { " error" } else { "" },
                self.input_summary
                    .as_deref()
                    .map(|s| format!("{s} -> "))
                    .unwrap_or_default(),
                self.content
            ),
        }
    }
}

/// Push to a bounded deque, dropping the oldest past `cap`.
pub fn push_bounded<T>(deque: &mut VecDeque<T>, item: T, cap: usize) {
    deque.push_back(item);
    while deque.len() > cap {
        deque.pop_front();
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

fn summarize_input(input: &serde_json::Value) -> Option<String> {
    match input {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(truncate_chars(s, 200).0),
        other => {
            let rendered = other.to_string();
            Some(truncate_chars(&rendered, 200).0)
        }
    }
}
