//! Task lifecycle events broadcast to every subscriber.

use scout_core::models::{ResearchFinding, ResearchTask};

#[derive(Debug, Clone)]
pub enum TaskEvent {
    Queued { task: ResearchTask },
    Started { task: ResearchTask },
    Completed { task: ResearchTask, finding: ResearchFinding },
    /// Final failure, after retries.
    Failed { task: ResearchTask, error: String },
}

impl TaskEvent {
    pub fn task(&self) -> &ResearchTask {
        match self {
            Self::Queued { task }
            | Self::Started { task }
            | Self::Completed { task, .. }
            | Self::Failed { task, .. } => task,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued { .. } => "queued",
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}
