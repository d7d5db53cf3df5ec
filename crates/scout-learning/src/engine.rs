//! MetaLearner: owns effectiveness scores and the reliability ledger.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::info;

use scout_core::config::LearningConfig;
use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::InjectionLogEntry;
use scout_core::traits::IResearchStorage;
use scout_session::SessionContext;

use crate::depth::{empirical_depth, recommend_by_rules, DepthRecommendation};
use crate::implicit::{infer_outcome, InferredOutcome};
use crate::signals::{is_helpful, ExplicitSignals};
use crate::source_quality::{record_finding_citations, revise_finding_citations};

/// Result of scoring one injection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub injection_id: String,
    pub score: f64,
    pub helpful: bool,
    /// Source domains whose reliability changed.
    pub sources_updated: usize,
}

pub struct MetaLearner {
    storage: Arc<dyn IResearchStorage>,
    config: RwLock<LearningConfig>,
}

impl MetaLearner {
    pub fn new(storage: Arc<dyn IResearchStorage>, config: LearningConfig) -> Self {
        Self {
            storage,
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> LearningConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(&self, config: LearningConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Score an injection, persist the score, and credit or debit every
    /// source domain its finding cited.
    ///
    /// Scoring the same injection again replaces its score. Its citations
    /// were already counted, so the ledger only moves when helpfulness flips.
    pub fn record_outcome(
        &self,
        injection_id: &str,
        signals: &ExplicitSignals,
    ) -> ScoutResult<OutcomeRecord> {
        let entry = self
            .storage
            .get_injection(injection_id)?
            .ok_or_else(|| ScoutError::InjectionNotFound {
                id: injection_id.to_string(),
            })?;

        let score = signals.score();
        let helpful = is_helpful(score);
        self.storage
            .record_effectiveness(injection_id, score, signals.resolved_issue)?;
        if signals.followup_needed {
            self.storage.mark_followup_injected(injection_id)?;
        }

        let previous = entry.effectiveness.map(is_helpful);
        let sources_updated = match (self.storage.get_finding(&entry.finding_id)?, previous) {
            (Some(finding), None) => {
                record_finding_citations(self.storage.as_ref(), &finding, helpful)?.len()
            }
            (Some(finding), Some(was)) if was != helpful => {
                revise_finding_citations(self.storage.as_ref(), &finding, helpful)?.len()
            }
            _ => 0,
        };

        info!(
            injection_id,
            finding_id = %entry.finding_id,
            score,
            helpful,
            sources_updated,
            "injection outcome recorded"
        );
        Ok(OutcomeRecord {
            injection_id: injection_id.to_string(),
            score,
            helpful,
            sources_updated,
        })
    }

    /// Infer outcomes for this session's unscored injections and record the
    /// conclusive ones. Returns each inference alongside its record.
    pub fn infer_session_outcomes(
        &self,
        ctx: &SessionContext,
        stuck_threshold: u32,
    ) -> ScoutResult<Vec<(InferredOutcome, OutcomeRecord)>> {
        if !self.config().implicit_inference_enabled {
            return Ok(Vec::new());
        }
        let pending: Vec<InjectionLogEntry> = self
            .storage
            .injections_for_session(&ctx.id)?
            .into_iter()
            .filter(|e| e.effectiveness.is_none())
            .collect();

        let mut out = Vec::with_capacity(pending.len());
        for entry in pending {
            let inferred = infer_outcome(&entry, ctx, stuck_threshold);
            if inferred.signals == ExplicitSignals::default() {
                continue;
            }
            let record = self.record_outcome(&entry.id, &inferred.signals)?;
            out.push((inferred, record));
        }
        Ok(out)
    }

    /// Reliability in [0, 1] for a (domain, topic) pair, if it was ever cited.
    pub fn source_reliability(&self, domain: &str, topic: &str) -> ScoutResult<Option<f64>> {
        Ok(self
            .storage
            .get_source_quality(domain, topic)?
            .map(|e| e.reliability))
    }

    /// Empirical depth for `domain` when history is conclusive, else rules.
    pub fn recommend_depth(
        &self,
        query: &str,
        domain: Option<&str>,
    ) -> ScoutResult<DepthRecommendation> {
        if let Some(domain) = domain {
            let outcomes = self.storage.depth_outcomes(domain)?;
            if let Some(rec) = empirical_depth(&outcomes, &self.config()) {
                return Ok(rec);
            }
        }
        Ok(recommend_by_rules(query))
    }
}
