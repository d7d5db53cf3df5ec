//! Focus tracking and stuck detection.
//!
//! The focus of a tool use is the basename of the first file it touched,
//! else the last component of the first directory, else `tool:<name>`.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::push_bounded;
use crate::extraction::file_refs::{basename, FileRefs};

/// An archived focus area and how long it lasted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub area: String,
    pub turns: u32,
    pub ended_at: DateTime<Utc>,
}

/// Result of a stuck check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StuckIndicator {
    pub is_stuck: bool,
    pub focus_area: Option<String>,
    pub turns: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusTracker {
    current: Option<String>,
    turns: u32,
    history: VecDeque<FocusRecord>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tool use on `area`. Returns the consecutive-turn count.
    pub fn observe(&mut self, area: &str, history_cap: usize, now: DateTime<Utc>) -> u32 {
        match self.current.as_deref() {
            Some(current) if current == area => {
                self.turns = self.turns.saturating_add(1);
            }
            _ => {
                if let Some(previous) = self.current.take() {
                    push_bounded(
                        &mut self.history,
                        FocusRecord {
                            area: previous,
                            turns: self.turns,
                            ended_at: now,
                        },
                        history_cap,
                    );
                }
                self.current = Some(area.to_string());
                self.turns = 1;
            }
        }
        self.turns
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn history(&self) -> &VecDeque<FocusRecord> {
        &self.history
    }

    pub fn indicator(&self, threshold: u32) -> StuckIndicator {
        StuckIndicator {
            is_stuck: self.current.is_some() && self.turns >= threshold,
            focus_area: self.current.clone(),
            turns: self.turns,
        }
    }
}

/// Focus area for one tool use.
pub fn infer_focus(tool_name: &str, refs: &FileRefs) -> String {
    if let Some(file) = refs.files.first() {
        return basename(file).to_string();
    }
    if let Some(dir) = refs.directories.first() {
        return basename(dir).to_string();
    }
    format!("tool:{tool_name}")
}
