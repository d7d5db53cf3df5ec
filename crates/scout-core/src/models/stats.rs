use serde::{Deserialize, Serialize};

/// Task counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub injected: usize,
}

impl TaskStats {
    pub fn total(&self) -> usize {
        self.queued + self.running + self.completed + self.failed + self.injected
    }
}
