//! Per-session counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    pub user_prompts: u64,
    pub tool_uses: u64,
    /// Tool uses that produced at least one error signature.
    pub error_turns: u64,
    pub research_triggered: u64,
    pub injections_queued: u64,
    pub injections_delivered: u64,
    pub tokens_delivered: u64,
}

impl SessionAnalytics {
    pub fn record_user_prompt(&mut self) {
        self.user_prompts += 1;
    }

    pub fn record_tool_use(&mut self, had_error: bool) {
        self.tool_uses += 1;
        if had_error {
            self.error_turns += 1;
        }
    }

    pub fn record_research(&mut self) {
        self.research_triggered += 1;
    }

    pub fn record_queued(&mut self) {
        self.injections_queued += 1;
    }

    pub fn record_delivery(&mut self, tokens: usize) {
        self.injections_delivered += 1;
        self.tokens_delivered += tokens as u64;
    }

    pub fn total_events(&self) -> u64 {
        self.user_prompts + self.tool_uses
    }

    /// Share of tool uses that hit an error.
    pub fn error_rate(&self) -> f64 {
        if self.tool_uses == 0 {
            return 0.0;
        }
        self.error_turns as f64 / self.tool_uses as f64
    }
}
