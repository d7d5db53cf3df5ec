//! Per-session delivery ledger.
//!
//! A delivery is allowed only when the session is under its injection count,
//! has tokens left in its cumulative budget, and its last delivery is at
//! least `cooldown_ms` old. Any one of those failing suppresses injection for
//! the current event.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use scout_core::config::InjectionConfig;

/// What a session has consumed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BudgetUsage {
    pub delivered: u32,
    pub tokens: usize,
    pub last_delivery: Option<DateTime<Utc>>,
}

/// Why a delivery was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetBlock {
    CountExhausted,
    TokensExhausted,
    CoolingDown { remaining_ms: u64 },
}

impl BudgetBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountExhausted => "count_exhausted",
            Self::TokensExhausted => "tokens_exhausted",
            Self::CoolingDown { .. } => "cooling_down",
        }
    }
}

#[derive(Debug, Default)]
pub struct BudgetLedger {
    sessions: DashMap<String, BudgetUsage>,
}

impl BudgetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token allowance for one block delivered at `now`, or why there is none.
    pub fn check(
        &self,
        session_id: &str,
        config: &InjectionConfig,
        now: DateTime<Utc>,
    ) -> Result<usize, BudgetBlock> {
        let usage = self.usage(session_id);
        if usage.delivered >= config.max_per_session {
            return Err(BudgetBlock::CountExhausted);
        }
        if let Some(last) = usage.last_delivery {
            let elapsed = (now - last).num_milliseconds().max(0) as u64;
            if elapsed < config.cooldown_ms {
                return Err(BudgetBlock::CoolingDown {
                    remaining_ms: config.cooldown_ms - elapsed,
                });
            }
        }
        let remaining = config
            .max_total_tokens_per_session
            .saturating_sub(usage.tokens);
        let allowance = config.max_tokens_per_injection.min(remaining);
        if allowance == 0 {
            return Err(BudgetBlock::TokensExhausted);
        }
        Ok(allowance)
    }

    pub fn record(&self, session_id: &str, tokens: usize, now: DateTime<Utc>) {
        let mut usage = self.sessions.entry(session_id.to_string()).or_default();
        usage.delivered = usage.delivered.saturating_add(1);
        usage.tokens = usage.tokens.saturating_add(tokens);
        usage.last_delivery = Some(now);
    }

    pub fn usage(&self, session_id: &str) -> BudgetUsage {
        self.sessions
            .get(session_id)
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    pub fn forget(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config() -> InjectionConfig {
        InjectionConfig {
            max_per_session: 2,
            max_tokens_per_injection: 100,
            max_total_tokens_per_session: 150,
            cooldown_ms: 1_000,
            ..InjectionConfig::default()
        }
    }

    #[test]
    fn fresh_session_gets_the_per_block_limit() {
        let ledger = BudgetLedger::new();
        assert_eq!(ledger.check("s", &config(), Utc::now()), Ok(100));
    }

    #[test]
    fn cooldown_then_cumulative_then_count() {
        let ledger = BudgetLedger::new();
        let cfg = config();
        let t0 = Utc::now();
        ledger.record("s", 90, t0);

        let early = ledger.check("s", &cfg, t0 + Duration::milliseconds(400));
        assert_eq!(early, Err(BudgetBlock::CoolingDown { remaining_ms: 600 }));

        let later = t0 + Duration::seconds(2);
        assert_eq!(ledger.check("s", &cfg, later), Ok(60));

        ledger.record("s", 60, later);
        let after = later + Duration::seconds(2);
        assert_eq!(ledger.check("s", &cfg, after), Err(BudgetBlock::CountExhausted));
    }

    #[test]
    fn spent_tokens_block_before_count() {
        let ledger = BudgetLedger::new();
        let cfg = InjectionConfig {
            max_per_session: 5,
            ..config()
        };
        let t0 = Utc::now();
        ledger.record("s", 150, t0);
        let later = t0 + Duration::seconds(5);
        assert_eq!(ledger.check("s", &cfg, later), Err(BudgetBlock::TokensExhausted));
        ledger.forget("s");
        assert_eq!(ledger.usage("s"), BudgetUsage::default());
    }
}
