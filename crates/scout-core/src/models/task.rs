use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PRIORITY, MIN_PRIORITY};

/// How much effort a research task may spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchDepth {
    Quick,
    Medium,
    Deep,
}

/// Time and breadth budget for one depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBudget {
    /// Soft target. Page fetching stops once it has elapsed and the finding
    /// is built from what is in hand.
    pub target: Duration,
    /// Hard timeout; exceeding it fails the attempt.
    pub hard_timeout: Duration,
    /// Results requested from each specialist adapter.
    pub max_results_per_source: usize,
    /// Top results whose full page content is fetched.
    pub pages_to_fetch: usize,
}

impl ResearchDepth {
    pub const ALL: [ResearchDepth; 3] = [Self::Quick, Self::Medium, Self::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Medium => "medium",
            Self::Deep => "deep",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Some(Self::Quick),
            "medium" => Some(Self::Medium),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }

    pub fn budget(&self) -> DepthBudget {
        match self {
            Self::Quick => DepthBudget {
                target: Duration::from_secs(15),
                hard_timeout: Duration::from_secs(90),
                max_results_per_source: 5,
                pages_to_fetch: 1,
            },
            Self::Medium => DepthBudget {
                target: Duration::from_secs(30),
                hard_timeout: Duration::from_secs(180),
                max_results_per_source: 8,
                pages_to_fetch: 3,
            },
            Self::Deep => DepthBudget {
                target: Duration::from_secs(60),
                hard_timeout: Duration::from_secs(300),
                max_results_per_source: 12,
                pages_to_fetch: 5,
            },
        }
    }
}

impl fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle. Transitions only move forward, except administrative
/// recovery (running → failed at startup) and queue-level retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Injected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Injected => "injected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "injected" => Some(Self::Injected),
            _ => None,
        }
    }

    /// Forward transitions allowed during normal operation.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Queued, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Completed, Self::Injected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Injected)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a research task to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Error signature in tool output.
    ToolError,
    /// Deprecation warning in tool output.
    Deprecation,
    /// Oracle-backed analysis of the session context.
    Oracle,
    /// Focus unchanged for too many turns.
    Stuck,
    /// Periodic strategic analysis.
    Strategic,
    /// Deliberate request from the host.
    Manual,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolError => "tool_error",
            Self::Deprecation => "deprecation",
            Self::Oracle => "oracle",
            Self::Stuck => "stuck",
            Self::Strategic => "strategic",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tool_error" => Some(Self::ToolError),
            "deprecation" => Some(Self::Deprecation),
            "oracle" => Some(Self::Oracle),
            "stuck" => Some(Self::Stuck),
            "strategic" => Some(Self::Strategic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// A request to the task queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    pub context: Option<String>,
    pub depth: ResearchDepth,
    pub trigger: TriggerSource,
    pub session_id: Option<String>,
    pub priority: u8,
    pub project_path: Option<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>, depth: ResearchDepth, trigger: TriggerSource) -> Self {
        Self {
            query: query.into(),
            context: None,
            depth,
            trigger,
            session_id: None,
            priority: 5,
            project_path: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }
}

/// Short-lived execution unit for one research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTask {
    pub id: String,
    pub query: String,
    pub context: Option<String>,
    pub depth: ResearchDepth,
    pub status: TaskStatus,
    pub trigger: TriggerSource,
    pub session_id: Option<String>,
    /// 1 (lowest) to 10 (highest).
    pub priority: u8,
    /// Completed execution attempts.
    pub attempts: u32,
    pub project_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Finding id on success.
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ResearchTask {
    pub fn from_request(request: &ResearchRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: request.query.clone(),
            context: request.context.clone(),
            depth: request.depth,
            status: TaskStatus::Queued,
            trigger: request.trigger,
            session_id: request.session_id.clone(),
            priority: request.priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            attempts: 0,
            project_path: request.project_path.clone(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_only() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Completed.can_transition_to(TaskStatus::Injected));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Injected.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn depth_budgets_match_targets() {
        assert_eq!(ResearchDepth::Quick.budget().hard_timeout, Duration::from_secs(90));
        assert_eq!(ResearchDepth::Medium.budget().target, Duration::from_secs(30));
        assert_eq!(ResearchDepth::Deep.budget().hard_timeout, Duration::from_secs(300));
    }

    #[test]
    fn request_priority_is_clamped() {
        let req = ResearchRequest::new("q", ResearchDepth::Quick, TriggerSource::Manual)
            .with_priority(42);
        assert_eq!(req.priority, 10);
        let req = req.with_priority(0);
        assert_eq!(req.priority, 1);
    }
}
