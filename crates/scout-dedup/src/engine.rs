//! DedupEngine: the single entry point for "has this been researched?".

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use scout_core::config::DedupConfig;
use scout_core::errors::ScoutResult;
use scout_core::traits::{IResearchStorage, IVectorIndex};
use scout_session::SessionContext;

use crate::inflight::InflightGuard;
use crate::lexical::{jaccard, significant_words};
use crate::semantic;

/// Why a query was (or was not) considered a repeat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DedupVerdict {
    Unique,
    InFlight { query: String, similarity: f64 },
    RecentSessionResearch { query: String, similarity: f64 },
    KnownFinding { finding_id: String, similarity: f64 },
    SemanticMatch { finding_id: String, score: f64 },
}

impl DedupVerdict {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Self::Unique)
    }

    /// Finding that already answers the query, if the verdict names one.
    pub fn finding_id(&self) -> Option<&str> {
        match self {
            Self::KnownFinding { finding_id, .. } | Self::SemanticMatch { finding_id, .. } => {
                Some(finding_id)
            }
            _ => None,
        }
    }
}

pub struct DedupEngine {
    storage: Arc<dyn IResearchStorage>,
    vector: Option<Arc<dyn IVectorIndex>>,
    config: RwLock<DedupConfig>,
    inflight: InflightGuard,
}

impl DedupEngine {
    pub fn new(storage: Arc<dyn IResearchStorage>, config: DedupConfig) -> Self {
        Self {
            storage,
            vector: None,
            config: RwLock::new(config),
            inflight: InflightGuard::new(),
        }
    }

    pub fn with_vector_index(mut self, index: Arc<dyn IVectorIndex>) -> Self {
        self.vector = Some(index);
        self
    }

    pub fn config(&self) -> DedupConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(&self, config: DedupConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn inflight(&self) -> &InflightGuard {
        &self.inflight
    }

    /// Run every check against `query`, cheapest first.
    pub async fn check(
        &self,
        query: &str,
        session: Option<&SessionContext>,
        now: DateTime<Utc>,
    ) -> ScoutResult<DedupVerdict> {
        let config = self.config();

        if let Some(ctx) = session {
            if let Some((running, similarity)) =
                self.inflight
                    .conflict(&ctx.id, query, config.inflight_similarity)
            {
                debug!(query, running = %running, "query already in flight");
                return Ok(DedupVerdict::InFlight {
                    query: running,
                    similarity,
                });
            }
            let verdict = check_session(ctx, query, &config, now);
            if verdict.is_duplicate() {
                return Ok(verdict);
            }
        }

        if config.semantic_enabled {
            if let Some(index) = self.vector.as_ref().filter(|v| v.is_ready()) {
                let window = Duration::seconds(config.semantic_window_secs as i64);
                match semantic::nearest_duplicate(
                    index.as_ref(),
                    query,
                    config.semantic_threshold,
                    window,
                    now,
                )
                .await
                {
                    Ok(Some(m)) => {
                        return Ok(DedupVerdict::SemanticMatch {
                            finding_id: m.finding_id,
                            score: m.score,
                        })
                    }
                    Ok(None) => return Ok(DedupVerdict::Unique),
                    Err(e) => {
                        warn!(error = %e, "vector index failed, falling back to lexical dedup");
                    }
                }
            }
        }

        self.check_history(query, &config, now)
    }

    /// Lexical scan over findings created within the history window.
    fn check_history(
        &self,
        query: &str,
        config: &DedupConfig,
        now: DateTime<Utc>,
    ) -> ScoutResult<DedupVerdict> {
        let since = now - Duration::seconds(config.history_window_secs as i64);
        let findings = self
            .storage
            .recent_findings(since, config.history_scan_limit)?;
        let words = significant_words(query);

        let best = findings
            .iter()
            .map(|f| (f, jaccard(&words, &significant_words(&f.query))))
            .filter(|(_, sim)| *sim > config.history_similarity)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Ok(match best {
            Some((finding, similarity)) => DedupVerdict::KnownFinding {
                finding_id: finding.id.clone(),
                similarity,
            },
            None => DedupVerdict::Unique,
        })
    }
}

/// Lexical check against research this session ran inside the session window.
pub fn check_session(
    ctx: &SessionContext,
    query: &str,
    config: &DedupConfig,
    now: DateTime<Utc>,
) -> DedupVerdict {
    let window = Duration::seconds(config.session_window_secs as i64);
    let words = significant_words(query);
    ctx.research_history
        .iter()
        .filter(|r| now - r.at <= window)
        .map(|r| (r, jaccard(&words, &significant_words(&r.query))))
        .filter(|(_, sim)| *sim > config.session_similarity)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(r, similarity)| DedupVerdict::RecentSessionResearch {
            query: r.query.clone(),
            similarity,
        })
        .unwrap_or(DedupVerdict::Unique)
}
