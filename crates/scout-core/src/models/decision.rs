use serde::{Deserialize, Serialize};

use super::task::{ResearchDepth, TriggerSource};

/// Kind of research a trigger asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchType {
    /// Fix the problem at hand.
    Direct,
    /// Find a different approach.
    Alternative,
    /// Confirm the current approach is sound.
    Validation,
}

impl ResearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Alternative => "alternative",
            Self::Validation => "validation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "alternative" => Some(Self::Alternative),
            "validation" => Some(Self::Validation),
            _ => None,
        }
    }
}

/// Outcome of one trigger evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDecision {
    pub should_research: bool,
    pub research_type: ResearchType,
    pub query: Option<String>,
    pub confidence: f64,
    pub priority: u8,
    pub reasoning: String,
    pub depth: Option<ResearchDepth>,
    pub source: TriggerSource,
}

impl TriggerDecision {
    /// The deterministic "no research" decision.
    pub fn no_research(reason: impl Into<String>) -> Self {
        Self {
            should_research: false,
            research_type: ResearchType::Direct,
            query: None,
            confidence: 0.0,
            priority: 1,
            reasoning: reason.into(),
            depth: None,
            source: TriggerSource::Oracle,
        }
    }

    /// True when the decision asks for research and names a query.
    pub fn is_actionable(&self) -> bool {
        self.should_research && self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
    }
}
