//! InjectionManager: admission of completed findings into sessions, and
//! delivery of the best pending block under the session's budget.
//!
//! Admission runs in the background: static score, then the oracle relevance
//! gate, then the session's pending queue. Delivery runs on the host's turn
//! and touches memory only; the caller persists the returned log entry.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn, Instrument};

use scout_core::config::InjectionConfig;
use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::{
    DisclosureLevel, InjectionLogEntry, PendingInjection, ResearchFinding, ResearchTask,
    TriggerSource,
};
use scout_core::traits::IResearchStorage;
use scout_observability::events;
use scout_session::SessionManager;
use scout_tokens::TokenCounter;

use crate::budget::{BudgetLedger, BudgetUsage};
use crate::disclosure::escalation;
use crate::format::{fit_block, render_detail};
use crate::relevance::RelevanceGate;
use crate::scorer::{best_candidate, score_candidate, session_overlap, CandidateScore};

const DEFAULT_PRIORITY: u8 = 5;

/// Per-candidate admission overrides.
#[derive(Debug, Clone, Default)]
pub struct AdmitOptions {
    /// Deliberate requests bypass the relevance gate.
    pub skip_relevance_gate: bool,
    pub priority: Option<u8>,
    pub pivot: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownSession,
    AlreadyQueued,
    LowScore { score: f64 },
    Irrelevant { rating: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Queued {
        score: CandidateScore,
        rating: Option<f64>,
    },
    Rejected(Rejection),
}

impl Admission {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// A block handed to the host, plus the log entry to persist for it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub block: String,
    pub tokens: usize,
    pub level: DisclosureLevel,
    pub task_id: Option<String>,
    pub entry: InjectionLogEntry,
}

pub struct InjectionManager {
    sessions: Arc<SessionManager>,
    storage: Arc<dyn IResearchStorage>,
    counter: TokenCounter,
    ledger: BudgetLedger,
    gate: RelevanceGate,
    /// Findings behind queued injections, by (session id, finding id).
    staged: DashMap<(String, String), ResearchFinding>,
    config: RwLock<InjectionConfig>,
}

impl InjectionManager {
    pub fn new(
        sessions: Arc<SessionManager>,
        storage: Arc<dyn IResearchStorage>,
        counter: TokenCounter,
        config: InjectionConfig,
    ) -> Self {
        Self {
            sessions,
            storage,
            counter,
            ledger: BudgetLedger::new(),
            gate: RelevanceGate::new(),
            staged: DashMap::new(),
            config: RwLock::new(config),
        }
    }

    pub fn with_gate(mut self, gate: RelevanceGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> InjectionConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(&self, config: InjectionConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn usage(&self, session_id: &str) -> BudgetUsage {
        self.ledger.usage(session_id)
    }

    // ── Admission ──

    /// Score and gate `finding` for `session_id`; queue it when it passes.
    pub async fn admit(
        &self,
        session_id: &str,
        finding: &ResearchFinding,
        task: Option<&ResearchTask>,
        opts: AdmitOptions,
    ) -> Admission {
        let span = scout_observability::injection_span!(session_id, finding.id);
        self.admit_inner(session_id, finding, task, opts)
            .instrument(span)
            .await
    }

    async fn admit_inner(
        &self,
        session_id: &str,
        finding: &ResearchFinding,
        task: Option<&ResearchTask>,
        opts: AdmitOptions,
    ) -> Admission {
        let Some(ctx) = self.sessions.snapshot(session_id) else {
            return Admission::Rejected(Rejection::UnknownSession);
        };
        if ctx
            .pending
            .iter()
            .any(|p| p.finding_id.as_deref() == Some(finding.id.as_str()))
        {
            return Admission::Rejected(Rejection::AlreadyQueued);
        }

        let config = self.config();
        let priority = opts
            .priority
            .or(task.map(|t| t.priority))
            .unwrap_or(DEFAULT_PRIORITY);
        let score = score_candidate(
            finding,
            priority,
            session_overlap(finding, &ctx),
            Utc::now(),
        );
        if config.static_gate_enabled && score.total < config.min_candidate_score {
            debug!(score = score.total, "candidate below minimum score");
            return Admission::Rejected(Rejection::LowScore { score: score.total });
        }

        let mut rating = None;
        if config.relevance_gate_enabled && !opts.skip_relevance_gate {
            let outcome = self
                .gate
                .evaluate(finding, &ctx, score.total, &config)
                .await;
            rating = outcome.rating;
            if !outcome.admitted {
                debug!(rating = ?outcome.rating, "candidate failed relevance gate");
                return Admission::Rejected(Rejection::Irrelevant {
                    rating: outcome.rating,
                });
            }
        }

        let pending = PendingInjection {
            query: finding.query.clone(),
            summary: finding.summary.clone(),
            relevance: rating.unwrap_or(score.total),
            priority,
            queued_at: Utc::now(),
            pivot: opts.pivot.or_else(|| pivot_for(task, finding)),
            finding_id: Some(finding.id.clone()),
            task_id: task.map(|t| t.id.clone()).or_else(|| finding.task_id.clone()),
            sources: finding.sources.clone(),
        };
        let key = (session_id.to_string(), finding.id.clone());
        self.staged.insert(key.clone(), finding.clone());
        if !self.sessions.queue_injection(session_id, pending) {
            self.staged.remove(&key);
            return Admission::Rejected(Rejection::UnknownSession);
        }

        info!(score = score.total, rating = ?rating, priority, "injection queued");
        Admission::Queued { score, rating }
    }

    /// Admit only the highest-scoring candidate among `candidates`.
    pub async fn admit_best(
        &self,
        session_id: &str,
        candidates: &[(ResearchFinding, Option<ResearchTask>)],
        opts: AdmitOptions,
    ) -> Admission {
        let Some(ctx) = self.sessions.snapshot(session_id) else {
            return Admission::Rejected(Rejection::UnknownSession);
        };
        let now = Utc::now();
        let scores: Vec<CandidateScore> = candidates
            .iter()
            .map(|(finding, task)| {
                let priority = opts
                    .priority
                    .or(task.as_ref().map(|t| t.priority))
                    .unwrap_or(DEFAULT_PRIORITY);
                score_candidate(finding, priority, session_overlap(finding, &ctx), now)
            })
            .collect();

        let config = self.config();
        let floor = if config.static_gate_enabled {
            config.min_candidate_score
        } else {
            0.0
        };
        match best_candidate(&scores, floor) {
            Some(i) => {
                let (finding, task) = &candidates[i];
                self.admit(session_id, finding, task.as_ref(), opts).await
            }
            None => Admission::Rejected(Rejection::LowScore {
                score: scores.iter().map(|s| s.total).fold(0.0, f64::max),
            }),
        }
    }

    // ── Delivery ──

    /// Pop the best pending injection and render it within the session's
    /// budget. `None` when nothing is pending or the budget says no.
    pub fn deliver(&self, session_id: &str, now: DateTime<Utc>) -> Option<Delivery> {
        let config = self.config();
        let allowance = match self.ledger.check(session_id, &config, now) {
            Ok(allowance) => allowance,
            Err(block) => {
                if self.sessions.pending_count(session_id) > 0 {
                    debug!(session_id, reason = block.as_str(), "injection held back");
                }
                return None;
            }
        };

        let pending = self.sessions.pop_injection(session_id)?;
        let staged_key = pending
            .finding_id
            .clone()
            .map(|id| (session_id.to_string(), id));
        let finding = staged_key
            .as_ref()
            .and_then(|key| self.staged.remove(key))
            .map(|(_, f)| f);
        let level = self.sessions.disclosure_level(session_id);

        let Some((block, level, tokens)) = fit_block(
            &self.counter,
            &pending,
            finding.as_ref(),
            level,
            config.max_citations,
            allowance,
        ) else {
            warn!(
                session_id,
                allowance,
                query = %pending.query,
                "injection does not fit budget, dropped"
            );
            return None;
        };

        self.ledger.record(session_id, tokens, now);
        self.sessions.record_delivery(session_id, tokens);
        if let Some(task_id) = &pending.task_id {
            self.sessions.mark_research_injected(session_id, task_id);
        }

        let finding_id = pending.finding_id.clone().unwrap_or_default();
        let mut entry = InjectionLogEntry::new(
            finding_id.as_str(),
            session_id,
            level,
            format!("research: {}", pending.query),
            tokens,
        );
        entry.injected_at = now;
        events::injection_delivered(session_id, &finding_id, tokens, level.as_u8());

        Some(Delivery {
            block,
            tokens,
            level,
            task_id: pending.task_id,
            entry,
        })
    }

    /// Persist a delivery's log entry.
    pub fn log_delivery(&self, delivery: &Delivery) -> ScoutResult<()> {
        self.storage.insert_injection(&delivery.entry)
    }

    // ── Disclosure ──

    /// Move the session to the next disclosure level if it kept struggling
    /// after a delivery. Returns the new level when it changed.
    pub fn refresh_disclosure(&self, session_id: &str) -> ScoutResult<Option<DisclosureLevel>> {
        if self.ledger.usage(session_id).delivered == 0 {
            return Ok(None);
        }
        let Some(ctx) = self.sessions.snapshot(session_id) else {
            return Ok(None);
        };
        let prior_followup = self
            .storage
            .injections_for_session(session_id)?
            .iter()
            .any(|e| e.followup_injected);
        let threshold = self.sessions.config().stuck_threshold;

        let next = escalation(&ctx, threshold, prior_followup);
        if let Some(level) = next {
            self.sessions.set_disclosure_level(session_id, level);
            info!(session_id, level = level.as_u8(), "disclosure escalated");
        }
        Ok(next)
    }

    /// Unconditionally step the session one level up, saturating at full.
    pub fn escalate(&self, session_id: &str) -> DisclosureLevel {
        let next = self.sessions.disclosure_level(session_id).next();
        self.sessions.set_disclosure_level(session_id, next);
        next
    }

    // ── Lookup ──

    /// Render a stored finding at `level` on request.
    pub fn finding_detail(&self, finding_id: &str, level: DisclosureLevel) -> ScoutResult<String> {
        let finding = self
            .storage
            .get_finding(finding_id)?
            .ok_or_else(|| ScoutError::FindingNotFound {
                id: finding_id.to_string(),
            })?;
        if let Err(e) = self.storage.touch_finding(finding_id) {
            warn!(finding_id, error = %e, "finding access time not updated");
        }
        Ok(render_detail(&finding, level, self.config().max_citations))
    }

    /// Drop budget state and staged findings for an ended session.
    pub fn forget_session(&self, session_id: &str) {
        self.ledger.forget(session_id);
        self.staged.retain(|(sid, _), _| sid != session_id);
    }
}

/// Stuck and strategic research suggests a change of direction.
fn pivot_for(task: Option<&ResearchTask>, finding: &ResearchFinding) -> Option<String> {
    let task = task?;
    if !matches!(task.trigger, TriggerSource::Stuck | TriggerSource::Strategic) {
        return None;
    }
    finding
        .key_points
        .first()
        .map(|kp| format!("Consider a different approach: {}", kp.text))
}
