//! Progressive disclosure: a session that keeps struggling after an injection
//! gets the next level on its following delivery.

use scout_core::models::DisclosureLevel;
use scout_session::SessionContext;

/// Retries that, together with a stuck focus, count as continued struggle.
const STUCK_RETRIES: u32 = 2;

/// Signs of continued struggle since the last delivery.
pub fn struggling(ctx: &SessionContext, stuck_threshold: u32, prior_followup: bool) -> bool {
    let stuck = ctx.stuck_indicator(stuck_threshold).is_stuck;
    ctx.same_error_repeated() || (stuck && ctx.retries >= STUCK_RETRIES) || prior_followup
}

/// The level the session should move to, when it should move at all.
pub fn escalation(
    ctx: &SessionContext,
    stuck_threshold: u32,
    prior_followup: bool,
) -> Option<DisclosureLevel> {
    (ctx.disclosure_level < DisclosureLevel::Full
        && struggling(ctx, stuck_threshold, prior_followup))
    .then(|| ctx.disclosure_level.next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ctx() -> SessionContext {
        SessionContext::new("s1", None, Utc::now())
    }

    #[test]
    fn calm_session_stays_put() {
        assert_eq!(escalation(&ctx(), 8, false), None);
    }

    #[test]
    fn repeated_error_escalates_one_level() {
        let mut c = ctx();
        c.retries = 1;
        assert_eq!(escalation(&c, 8, false), Some(DisclosureLevel::KeyPoints));
        c.disclosure_level = DisclosureLevel::KeyPoints;
        assert_eq!(escalation(&c, 8, false), Some(DisclosureLevel::Full));
        c.disclosure_level = DisclosureLevel::Full;
        assert_eq!(escalation(&c, 8, false), None);
    }

    #[test]
    fn followup_flag_escalates() {
        assert_eq!(escalation(&ctx(), 8, true), Some(DisclosureLevel::KeyPoints));
    }
}
