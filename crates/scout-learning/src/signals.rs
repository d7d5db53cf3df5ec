//! Explicit outcome signals and their score.

use serde::{Deserialize, Serialize};

const RESOLVED_WEIGHT: f64 = 0.5;
const COMPLETED_WEIGHT: f64 = 0.3;
const SAME_ERROR_PENALTY: f64 = 0.4;
const IGNORED_PENALTY: f64 = 0.2;
const FOLLOWUP_PENALTY: f64 = 0.1;

/// What happened after an injection, as reported by the host or inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitSignals {
    pub resolved_issue: bool,
    pub task_completed: bool,
    pub same_error_repeated: bool,
    pub ignored: bool,
    pub followup_needed: bool,
}

impl ExplicitSignals {
    /// Weighted sum clamped to [-1, 1].
    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.resolved_issue {
            score += RESOLVED_WEIGHT;
        }
        if self.task_completed {
            score += COMPLETED_WEIGHT;
        }
        if self.same_error_repeated {
            score -= SAME_ERROR_PENALTY;
        }
        if self.ignored {
            score -= IGNORED_PENALTY;
        }
        if self.followup_needed {
            score -= FOLLOWUP_PENALTY;
        }
        score.clamp(-1.0, 1.0)
    }
}

/// An outcome counts as helpful only when its score is strictly positive.
pub fn is_helpful(score: f64) -> bool {
    score > 0.0
}
