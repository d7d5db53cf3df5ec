//! Inactivity sweep.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::manager::{SessionEnd, SessionManager};

/// End every session idle beyond the configured timeout at `now`. A session
/// that saw an event since the scan is left alone.
pub fn sweep_inactive(manager: &SessionManager, now: DateTime<Utc>) -> Vec<SessionEnd> {
    let idle = manager.idle_sessions(now);
    if !idle.is_empty() {
        debug!(count = idle.len(), "sweeping inactive sessions");
    }
    idle.iter()
        .filter_map(|id| manager.end_session_if_idle(id, now))
        .collect()
}
