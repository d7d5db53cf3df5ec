//! TriggerEngine: one decision per host event.
//!
//! `evaluate` runs the whole pipeline: quick patterns, then proactive
//! triggers, then gated oracle analysis. Whatever fires is checked against
//! the per-session cooldown and the dedup engine before it is returned as
//! actionable. The engine never fails; every internal error degrades to a
//! "no research" decision.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn, Instrument};

use scout_core::config::TriggerConfig;
use scout_core::models::TriggerDecision;
use scout_core::traits::IOracle;
use scout_dedup::{window_fingerprint, DedupEngine, WindowFingerprints};
use scout_learning::{recommend_by_rules, MetaLearner};
use scout_observability::degradation::{self, SharedDegradations};
use scout_observability::events;
use scout_session::extraction::primary_domain;
use scout_session::{EntryKind, SessionContext, SessionManager};

use crate::cooldown::Cooldown;
use crate::digest::build_prompt;
use crate::parse::{fallback_query, keyword_heuristic, parse_decision, Floors};
use crate::proactive::proactive_decision;
use crate::quick::quick_analyze;

const ORACLE_COMPONENT: &str = "trigger_oracle";

pub struct TriggerEngine {
    sessions: Arc<SessionManager>,
    dedup: Arc<DedupEngine>,
    oracle: Option<Arc<dyn IOracle>>,
    learner: Option<Arc<MetaLearner>>,
    degradations: Option<SharedDegradations>,
    config: RwLock<TriggerConfig>,
    cooldown: Cooldown,
    fingerprints: WindowFingerprints,
}

impl TriggerEngine {
    pub fn new(
        sessions: Arc<SessionManager>,
        dedup: Arc<DedupEngine>,
        config: TriggerConfig,
    ) -> Self {
        Self {
            sessions,
            dedup,
            oracle: None,
            learner: None,
            degradations: None,
            config: RwLock::new(config),
            cooldown: Cooldown::new(),
            fingerprints: WindowFingerprints::new(),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn IOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Depth for decisions that do not name one comes from the learner.
    pub fn with_learner(mut self, learner: Arc<MetaLearner>) -> Self {
        self.learner = Some(learner);
        self
    }

    pub fn with_degradations(mut self, tracker: SharedDegradations) -> Self {
        self.degradations = Some(tracker);
        self
    }

    pub fn config(&self) -> TriggerConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(&self, config: TriggerConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    // ── Paths ──

    /// Zero-latency pattern match over the latest window entry.
    pub fn quick(&self, ctx: &SessionContext) -> Option<TriggerDecision> {
        quick_analyze(&ctx.recent_entries(1))
    }

    /// Stuck focus or due strategic analysis. A strategic hit resets the
    /// session's strategic counter.
    pub fn check_proactive_triggers(&self, ctx: &SessionContext) -> Option<TriggerDecision> {
        let stuck = self.sessions.stuck_indicator(&ctx.id)?;
        let strategic_due = self.sessions.should_trigger_strategic_analysis(&ctx.id);
        let suggestions = if strategic_due {
            self.sessions.complementary_suggestions(&ctx.id)
        } else {
            Vec::new()
        };
        let decision = proactive_decision(ctx, &stuck, strategic_due, &suggestions)?;
        if decision.source == scout_core::models::TriggerSource::Strategic {
            self.sessions.mark_strategic_analysis_performed(&ctx.id);
        }
        Some(decision)
    }

    /// Oracle-backed analysis of the session digest.
    ///
    /// Skipped for user prompts, while the session cools down, and when the
    /// recent window was already analyzed. Oracle failures and timeouts
    /// degrade to "no research"; an unparseable reply falls back to a
    /// keyword reading.
    pub async fn analyze(&self, ctx: &SessionContext, trigger: EntryKind) -> TriggerDecision {
        if trigger == EntryKind::UserPrompt {
            return TriggerDecision::no_research("user prompts never trigger research");
        }
        let config = self.config();
        if self
            .cooldown
            .is_cooling(&ctx.id, config.cooldown_secs, Utc::now())
        {
            return TriggerDecision::no_research("session cooling down");
        }

        let window = ctx.recent_entries(config.dedup_window_entries);
        if window.is_empty() {
            return TriggerDecision::no_research("empty conversation window");
        }
        let fingerprint = window_fingerprint(&window);
        if self.fingerprints.is_already_analyzed(&ctx.id, &fingerprint) {
            return TriggerDecision::no_research("window already analyzed");
        }

        let Some(oracle) = self.oracle.as_ref() else {
            return TriggerDecision::no_research("no oracle configured");
        };
        self.fingerprints.record(&ctx.id, fingerprint);
        self.sessions.mark_analyzed(&ctx.id);

        let threshold = self.sessions.config().stuck_threshold;
        let stuck = ctx.stuck_indicator(threshold);
        let suggestions = scout_session::strategic::complementary_suggestions(ctx);
        let prompt = build_prompt(ctx, &stuck, &suggestions, config.digest_entries);

        let limit = Duration::from_secs(config.oracle_timeout_secs);
        let reply = match tokio::time::timeout(limit, oracle.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                self.degrade(&e.to_string(), "no_research");
                return TriggerDecision::no_research(format!("oracle failed: {e}"));
            }
            Err(_) => {
                self.degrade(
                    &format!("timed out after {}s", config.oracle_timeout_secs),
                    "no_research",
                );
                return TriggerDecision::no_research("oracle timed out");
            }
        };
        degradation::recovered(self.degradations.as_ref(), ORACLE_COMPONENT);

        let floors = Floors::from_config(&config);
        let mut decision = match parse_decision(&reply, &floors) {
            Some(decision) => decision,
            None => {
                self.degrade("malformed reply", "keyword_heuristic");
                keyword_heuristic(&reply, ctx, &floors)
            }
        };
        if decision.should_research && decision.query.is_none() {
            decision.query = fallback_query(ctx);
        }
        decision
    }

    /// Full pipeline for one event on `session_id`.
    pub async fn evaluate(&self, session_id: &str, trigger: EntryKind) -> TriggerDecision {
        if trigger == EntryKind::UserPrompt {
            return TriggerDecision::no_research("user prompts never trigger research");
        }
        let Some(ctx) = self.sessions.snapshot(session_id) else {
            return TriggerDecision::no_research("unknown session");
        };
        let span = scout_observability::analysis_span!(session_id);
        self.evaluate_context(&ctx, trigger).instrument(span).await
    }

    async fn evaluate_context(&self, ctx: &SessionContext, trigger: EntryKind) -> TriggerDecision {
        let config = self.config();
        let now = Utc::now();
        if self.cooldown.is_cooling(&ctx.id, config.cooldown_secs, now) {
            return TriggerDecision::no_research("session cooling down");
        }

        let quick = if config.quick_analysis_enabled {
            self.quick(ctx)
        } else {
            None
        };
        let proactive = match quick {
            Some(_) => None,
            None if config.proactive_enabled => self.check_proactive_triggers(ctx),
            None => None,
        };
        let mut decision = match quick.or(proactive) {
            Some(decision) => decision,
            None => self.analyze(ctx, trigger).await,
        };
        if !decision.is_actionable() {
            decision.should_research = false;
            return decision;
        }

        let query = decision.query.clone().unwrap_or_default();
        match self.dedup.check(&query, Some(ctx), now).await {
            Ok(verdict) if verdict.is_duplicate() => {
                debug!(session_id = %ctx.id, query, ?verdict, "trigger suppressed as duplicate");
                return TriggerDecision::no_research(format!("duplicate research: {query}"));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "dedup check failed, treating query as unique"),
        }

        if decision.depth.is_none() {
            decision.depth = Some(self.pick_depth(&query, ctx));
        }
        self.cooldown.record(&ctx.id, now);
        events::research_triggered(
            &ctx.id,
            decision.source.as_str(),
            &query,
            decision.confidence,
        );
        decision
    }

    fn pick_depth(&self, query: &str, ctx: &SessionContext) -> scout_core::models::ResearchDepth {
        let domain = primary_domain(query).or_else(|| {
            ctx.tech_stack
                .iter()
                .next()
                .and_then(|t| primary_domain(t))
        });
        match &self.learner {
            Some(learner) => match learner.recommend_depth(query, domain) {
                Ok(rec) => rec.depth,
                Err(e) => {
                    warn!(error = %e, "depth history unavailable, using rules");
                    recommend_by_rules(query).depth
                }
            },
            None => recommend_by_rules(query).depth,
        }
    }

    fn degrade(&self, failure: &str, fallback: &str) {
        degradation::report(
            self.degradations.as_ref(),
            ORACLE_COMPONENT,
            failure,
            fallback,
        );
    }

    /// Drop per-session gate state once a session ends.
    pub fn forget_session(&self, session_id: &str) {
        self.cooldown.forget(session_id);
        self.fingerprints.forget(session_id);
    }
}
