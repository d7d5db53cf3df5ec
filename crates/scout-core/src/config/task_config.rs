use serde::{Deserialize, Serialize};

use super::defaults;

/// Task queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Global cap on simultaneously running research tasks.
    pub max_concurrent: usize,
    /// Extra attempts after a failed run before the task is marked failed.
    pub max_retries: u32,
    /// Capacity of the lifecycle event broadcast channel.
    pub event_channel_capacity: usize,
    /// Use the oracle to synthesize findings (extractive fallback otherwise).
    pub oracle_synthesis: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::DEFAULT_MAX_CONCURRENT_TASKS,
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            event_channel_capacity: defaults::DEFAULT_EVENT_CHANNEL_CAPACITY,
            oracle_synthesis: true,
        }
    }
}
