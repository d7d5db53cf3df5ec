//! Request and response shapes of the runtime surface.

use serde::{Deserialize, Serialize};

use scout_core::models::{DisclosureLevel, ResearchDepth};
use scout_injection::BudgetUsage;
use scout_observability::TrackedDegradation;
use scout_session::{ResearchRecord, SessionAnalytics, StuckIndicator};
use scout_tasks::QueueStats;

/// Answer to one host event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventResponse {
    pub session_id: String,
    /// Rendered block for the host, when one was delivered.
    pub injection: Option<String>,
    /// This event matched a research-worthy pattern and its analysis was
    /// handed to the background worker. Cooldown, dedup and the in-flight
    /// guard may still suppress the research.
    pub research_queued: bool,
    /// Query the error-pattern table proposes for this event. The background
    /// analysis still applies cooldown and dedup before submitting it.
    pub queued_query: Option<String>,
    /// Injections still waiting after this delivery.
    pub pending_injections: usize,
}

/// A deliberate research request from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualResearchRequest {
    pub query: String,
    /// Learner recommendation when absent.
    pub depth: Option<ResearchDepth>,
    /// Session that should receive the finding, if any.
    pub session_id: Option<String>,
    pub priority: Option<u8>,
    pub context: Option<String>,
    pub project_path: Option<String>,
}

impl ManualResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: ResearchDepth) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub version: &'static str,
    pub queue: QueueStats,
    pub active_sessions: usize,
    pub adapters: Vec<String>,
    pub oracle_available: bool,
    pub background_running: bool,
    /// Components currently running on a fallback.
    pub degradations: Vec<TrackedDegradation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub analytics: SessionAnalytics,
    pub pending_injections: usize,
    pub disclosure_level: DisclosureLevel,
    pub budget: BudgetUsage,
    pub current_task: Option<String>,
    pub focus: StuckIndicator,
    pub topics: Vec<String>,
    pub tech_stack: Vec<String>,
    pub research: Vec<ResearchRecord>,
}
