//! Structured log events for key pipeline operations.
//!
//! Each function emits a `tracing` event with structured fields.

/// A trigger decided research is worth running.
pub fn research_triggered(session_id: &str, source: &str, query: &str, confidence: f64) {
    tracing::info!(
        event = "research_triggered",
        session_id = %session_id,
        source = %source,
        query = %query,
        confidence = confidence,
        "research triggered"
    );
}

/// A research task produced a finding.
pub fn task_completed(task_id: &str, finding_id: &str, sources: usize, duration_ms: u64) {
    tracing::info!(
        event = "task_completed",
        task_id = %task_id,
        finding_id = %finding_id,
        sources = sources,
        duration_ms = duration_ms,
        "research task completed"
    );
}

/// A research task failed for good.
pub fn task_failed(task_id: &str, error: &str, attempts: u32) {
    tracing::warn!(
        event = "task_failed",
        task_id = %task_id,
        error = %error,
        attempts = attempts,
        "research task failed"
    );
}

/// A block was delivered into a session.
pub fn injection_delivered(session_id: &str, finding_id: &str, tokens: usize, level: u8) {
    tracing::info!(
        event = "injection_delivered",
        session_id = %session_id,
        finding_id = %finding_id,
        tokens = tokens,
        disclosure_level = level,
        "injection delivered"
    );
}

/// A component fell back to a cheaper path.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

/// A session was ended by the host or the inactivity sweep.
pub fn session_ended(session_id: &str, tool_uses: u64, injections: u64) {
    tracing::info!(
        event = "session_ended",
        session_id = %session_id,
        tool_uses = tool_uses,
        injections = injections,
        "session ended"
    );
}
