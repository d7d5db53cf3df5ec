//! Per-session spacing between emitted triggers.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct Cooldown {
    last: DashMap<String, DateTime<Utc>>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while fewer than `secs` seconds have passed since the last record.
    pub fn is_cooling(&self, session_id: &str, secs: u64, now: DateTime<Utc>) -> bool {
        self.last
            .get(session_id)
            .is_some_and(|at| (now - *at).num_milliseconds() < secs as i64 * 1_000)
    }

    pub fn record(&self, session_id: &str, now: DateTime<Utc>) {
        self.last.insert(session_id.to_string(), now);
    }

    pub fn last(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.last.get(session_id).map(|at| *at)
    }

    pub fn forget(&self, session_id: &str) {
        self.last.remove(session_id);
    }
}
