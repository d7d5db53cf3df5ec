//! SessionContext: everything known about one live coding session.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scout_core::config::SessionConfig;
use scout_core::models::{DisclosureLevel, PendingInjection, SessionRecord};

use crate::analytics::SessionAnalytics;
use crate::conversation::{push_bounded, ConversationEntry, ToolUseEvent};
use crate::extraction::{
    classify_errors, detect_task, detect_task_in_input, detect_tech, extract_file_refs,
    extract_topics, ErrorSignature,
};
use crate::focus::{infer_focus, FocusTracker, StuckIndicator};

/// One research attempt made on behalf of this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub query: String,
    pub task_id: Option<String>,
    pub at: DateTime<Utc>,
    pub injected: bool,
    pub confidence: f64,
}

/// Per-session state. Owned by the `SessionManager`; callers only see clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: String,
    pub project_path: Option<String>,
    pub window: VecDeque<ConversationEntry>,
    pub topics: BTreeSet<String>,
    pub tech_stack: BTreeSet<String>,
    pub current_task: Option<String>,
    pub task_history: VecDeque<String>,
    pub focus: FocusTracker,
    pub touched_files: BTreeSet<String>,
    pub touched_dirs: BTreeSet<String>,
    pub recent_errors: VecDeque<ErrorSignature>,
    pub research_history: VecDeque<ResearchRecord>,
    /// Sorted by priority desc, then queued-at asc.
    pub pending: Vec<PendingInjection>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub last_strategic: Option<DateTime<Utc>>,
    pub tool_uses_since_strategic: u32,
    pub active: bool,
    pub disclosure_level: DisclosureLevel,
    /// Consecutive tool uses that repeated an already-seen error.
    pub retries: u32,
    pub analytics: SessionAnalytics,
}

impl SessionContext {
    pub fn new(id: impl Into<String>, project_path: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            project_path,
            window: VecDeque::new(),
            topics: BTreeSet::new(),
            tech_stack: BTreeSet::new(),
            current_task: None,
            task_history: VecDeque::new(),
            focus: FocusTracker::new(),
            touched_files: BTreeSet::new(),
            touched_dirs: BTreeSet::new(),
            recent_errors: VecDeque::new(),
            research_history: VecDeque::new(),
            pending: Vec::new(),
            started_at: now,
            last_activity: now,
            last_analyzed: None,
            last_strategic: None,
            tool_uses_since_strategic: 0,
            active: true,
            disclosure_level: DisclosureLevel::Summary,
            retries: 0,
            analytics: SessionAnalytics::default(),
        }
    }

    pub fn apply_user_prompt(&mut self, content: &str, config: &SessionConfig, now: DateTime<Utc>) {
        self.touch(now);
        push_bounded(
            &mut self.window,
            ConversationEntry::user_prompt(content),
            config.window_size,
        );
        self.absorb_topics(content);
        for tech in detect_tech(content) {
            self.tech_stack.insert(tech.to_string());
        }
        if let Some(task) = detect_task(content) {
            self.set_task(task, config.task_history);
        }
        self.analytics.record_user_prompt();
    }

    /// Fold one tool use into the context. Returns the error signatures it produced.
    pub fn apply_tool_use(
        &mut self,
        event: &ToolUseEvent,
        config: &SessionConfig,
        now: DateTime<Utc>,
    ) -> Vec<ErrorSignature> {
        self.touch(now);
        let entry = ConversationEntry::tool_use(event, config.tool_output_max_chars);

        let refs = extract_file_refs(&event.input);
        for file in &refs.files {
            insert_capped(&mut self.touched_files, file, config.max_touched_paths);
        }
        for dir in &refs.directories {
            insert_capped(&mut self.touched_dirs, dir, config.max_touched_paths);
        }
        let area = infer_focus(&event.tool_name, &refs);
        self.focus.observe(&area, config.focus_history, now);

        let scan = format!(
            "{} {} {}",
            entry.input_summary.as_deref().unwrap_or_default(),
            refs.files.join(" "),
            entry.content
        );
        for tech in detect_tech(&scan) {
            self.tech_stack.insert(tech.to_string());
        }
        self.absorb_topics(&scan);
        if let Some(task) = detect_task_in_input(&event.input) {
            self.set_task(task, config.task_history);
        }

        let signatures = classify_errors(&entry.content, now);
        self.track_retries(&signatures, event.is_error);
        for sig in &signatures {
            push_bounded(&mut self.recent_errors, sig.clone(), config.error_history);
        }

        push_bounded(&mut self.window, entry, config.window_size);
        self.tool_uses_since_strategic = self.tool_uses_since_strategic.saturating_add(1);
        self.analytics
            .record_tool_use(event.is_error || !signatures.is_empty());
        signatures
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.active = true;
    }

    fn absorb_topics(&mut self, text: &str) {
        for topic in extract_topics(text) {
            self.topics.insert(topic.to_string());
        }
    }

    fn set_task(&mut self, task: String, cap: usize) {
        if self.current_task.as_deref() == Some(task.as_str()) {
            return;
        }
        if let Some(previous) = self.current_task.replace(task) {
            push_bounded(&mut self.task_history, previous, cap);
        }
    }

    fn track_retries(&mut self, signatures: &[ErrorSignature], is_error: bool) {
        if signatures.is_empty() {
            if !is_error {
                self.retries = 0;
            }
            return;
        }
        let repeated = signatures
            .iter()
            .any(|s| self.recent_errors.iter().any(|seen| seen.same_as(s)));
        if repeated {
            self.retries = self.retries.saturating_add(1);
        }
    }

    /// The latest tool use repeated an error already seen in this session.
    pub fn same_error_repeated(&self) -> bool {
        self.retries > 0
    }

    pub fn stuck_indicator(&self, threshold: u32) -> StuckIndicator {
        self.focus.indicator(threshold)
    }

    /// The last `n` window entries, oldest first.
    pub fn recent_entries(&self, n: usize) -> Vec<&ConversationEntry> {
        let skip = self.window.len().saturating_sub(n);
        self.window.iter().skip(skip).collect()
    }

    pub fn latest_entry(&self) -> Option<&ConversationEntry> {
        self.window.back()
    }

    /// Insert keeping priority desc, then FIFO among equal priorities.
    pub fn queue_injection(&mut self, injection: PendingInjection) {
        let pos = self
            .pending
            .iter()
            .position(|p| {
                p.priority < injection.priority
                    || (p.priority == injection.priority && p.queued_at > injection.queued_at)
            })
            .unwrap_or(self.pending.len());
        self.pending.insert(pos, injection);
        self.analytics.record_queued();
    }

    pub fn pop_injection(&mut self) -> Option<PendingInjection> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn record_research(&mut self, record: ResearchRecord, cap: usize) {
        push_bounded(&mut self.research_history, record, cap);
        self.analytics.record_research();
    }

    /// Flag the most recent record for `task_id` as injected.
    pub fn mark_research_injected(&mut self, task_id: &str) -> bool {
        match self
            .research_history
            .iter_mut()
            .rev()
            .find(|r| r.task_id.as_deref() == Some(task_id))
        {
            Some(record) => {
                record.injected = true;
                true
            }
            None => false,
        }
    }

    pub fn to_record(&self, ended_at: Option<DateTime<Utc>>) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            project_path: self.project_path.clone(),
            started_at: self.started_at,
            last_activity: self.last_activity,
            ended_at,
            active: ended_at.is_none() && self.active,
            snapshot: serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
        }
    }
}

fn insert_capped(set: &mut BTreeSet<String>, value: &str, cap: usize) {
    if set.len() < cap || set.contains(value) {
        set.insert(value.to_string());
    }
}
