//! Outcome inference from session state when no explicit feedback arrives.

use scout_core::models::{DisclosureLevel, InjectionLogEntry};
use scout_session::SessionContext;

use crate::signals::ExplicitSignals;

/// Retries above this with the same error count against an injection.
const RETRY_LIMIT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredOutcome {
    pub signals: ExplicitSignals,
    /// The session needs a deeper disclosure tier.
    pub escalate: bool,
}

/// Infer how `entry` went from what the session did afterwards.
pub fn infer_outcome(
    entry: &InjectionLogEntry,
    ctx: &SessionContext,
    stuck_threshold: u32,
) -> InferredOutcome {
    let errors_since = ctx
        .recent_errors
        .iter()
        .filter(|e| e.seen_at > entry.injected_at)
        .count();

    if errors_since > 0 && ctx.same_error_repeated() && ctx.retries > RETRY_LIMIT {
        return InferredOutcome {
            signals: ExplicitSignals {
                same_error_repeated: true,
                ..Default::default()
            },
            escalate: entry.disclosure_level < DisclosureLevel::Full,
        };
    }

    let stuck = ctx.stuck_indicator(stuck_threshold).is_stuck;
    if stuck && entry.disclosure_level == DisclosureLevel::Summary {
        return InferredOutcome {
            signals: ExplicitSignals {
                ignored: true,
                ..Default::default()
            },
            escalate: true,
        };
    }

    if errors_since == 0 {
        return InferredOutcome {
            signals: ExplicitSignals {
                task_completed: true,
                ..Default::default()
            },
            escalate: false,
        };
    }

    InferredOutcome {
        signals: ExplicitSignals::default(),
        escalate: false,
    }
}
