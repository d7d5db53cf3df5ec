//! Span definitions per pipeline stage.

/// Span around one trigger evaluation.
#[macro_export]
macro_rules! analysis_span {
    ($session_id:expr) => {
        tracing::info_span!("scout.analysis", session_id = %$session_id)
    };
}

/// Span around one research task run.
#[macro_export]
macro_rules! research_span {
    ($task_id:expr, $depth:expr) => {
        tracing::info_span!("scout.research", task_id = %$task_id, depth = %$depth)
    };
}

/// Span around admitting a finding into a session.
#[macro_export]
macro_rules! injection_span {
    ($session_id:expr, $finding_id:expr) => {
        tracing::info_span!(
            "scout.injection",
            session_id = %$session_id,
            finding_id = %$finding_id
        )
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const ANALYSIS: &str = "scout.analysis";
    pub const RESEARCH: &str = "scout.research";
    pub const INJECTION: &str = "scout.injection";
}
