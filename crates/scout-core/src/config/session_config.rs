use serde::{Deserialize, Serialize};

use super::defaults;

/// Session context store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Conversation window length; oldest entries are dropped past this.
    pub window_size: usize,
    /// Tool output is truncated to this many characters.
    pub tool_output_max_chars: usize,
    /// Number of classified error signatures retained.
    pub error_history: usize,
    /// Number of archived focus areas retained.
    pub focus_history: usize,
    /// Number of previous "current tasks" retained.
    pub task_history: usize,
    /// Number of research history records retained.
    pub research_history: usize,
    /// Cap on distinct touched files / directories.
    pub max_touched_paths: usize,
    /// Consecutive same-focus tool uses before a session counts as stuck.
    pub stuck_threshold: u32,
    /// Tool uses since the last strategic analysis before another is due.
    pub strategic_tool_use_threshold: u32,
    /// Minimum seconds between strategic analyses.
    pub strategic_min_interval_secs: u64,
    /// Sessions idle longer than this are ended by the sweep.
    pub inactivity_timeout_secs: u64,
    /// Interval between inactivity sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::DEFAULT_WINDOW_SIZE,
            tool_output_max_chars: defaults::DEFAULT_TOOL_OUTPUT_MAX_CHARS,
            error_history: defaults::DEFAULT_ERROR_HISTORY,
            focus_history: defaults::DEFAULT_FOCUS_HISTORY,
            task_history: defaults::DEFAULT_TASK_HISTORY,
            research_history: defaults::DEFAULT_RESEARCH_HISTORY,
            max_touched_paths: defaults::DEFAULT_MAX_TOUCHED_PATHS,
            stuck_threshold: defaults::DEFAULT_STUCK_THRESHOLD,
            strategic_tool_use_threshold: defaults::DEFAULT_STRATEGIC_TOOL_USE_THRESHOLD,
            strategic_min_interval_secs: defaults::DEFAULT_STRATEGIC_MIN_INTERVAL_SECS,
            inactivity_timeout_secs: defaults::DEFAULT_INACTIVITY_TIMEOUT_SECS,
            sweep_interval_secs: defaults::DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}
