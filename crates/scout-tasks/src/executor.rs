//! ResearchExecutor: one research run from query to finding.
//!
//! Every specialist adapter is queried concurrently; a failing adapter only
//! loses its own results. The run fails only when the merged pool is empty.
//! Page fetches share whatever is left of the depth's soft target; past it,
//! synthesis works from snippets and the pages already fetched.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use scout_core::constants::GENERAL_TOPIC;
use scout_core::errors::{ScoutResult, TaskError};
use scout_core::models::{ResearchFinding, ResearchTask, SearchRequest, SearchResult};
use scout_core::traits::{IResearchStorage, ISearchAdapter};
use scout_session::extraction::primary_domain;
use scout_storage::CachingFetcher;

use crate::ranking::{merge_results, rank, RankedResult};
use crate::synthesis::{Pages, Synthesizer};

pub struct ResearchExecutor {
    adapters: Vec<Arc<dyn ISearchAdapter>>,
    fetcher: Option<CachingFetcher>,
    storage: Arc<dyn IResearchStorage>,
    synthesizer: Synthesizer,
}

impl ResearchExecutor {
    pub fn new(
        storage: Arc<dyn IResearchStorage>,
        adapters: Vec<Arc<dyn ISearchAdapter>>,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            adapters,
            fetcher: None,
            storage,
            synthesizer,
        }
    }

    /// Fetch full page text for the top results through the URL cache.
    pub fn with_fetcher(mut self, fetcher: CachingFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    pub fn adapter_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub async fn execute(&self, task: &ResearchTask) -> ScoutResult<ResearchFinding> {
        let budget = task.depth.budget();
        let soft_deadline = Instant::now() + budget.target;
        let request = SearchRequest {
            query: task.query.clone(),
            max_results: budget.max_results_per_source,
        };

        let pool = merge_results(self.search_all(&request).await);
        if pool.is_empty() {
            return Err(TaskError::EmptyResultPool {
                query: task.query.clone(),
            }
            .into());
        }

        let topic = topic_of(task);
        let ranked = rank(pool, |domain| {
            self.storage
                .get_source_quality(domain, &topic)
                .ok()
                .flatten()
                .map(|e| e.reliability)
        });
        debug!(
            task_id = %task.id,
            results = ranked.len(),
            best = ranked.first().map(|r| r.score).unwrap_or_default(),
            "result pool ranked"
        );

        let pages = self
            .fetch_pages(&ranked, budget.pages_to_fetch, soft_deadline)
            .await;
        Ok(self.synthesizer.synthesize(task, &ranked, &pages).await)
    }

    /// Query every adapter at once. Failures are logged and dropped.
    async fn search_all(&self, request: &SearchRequest) -> Vec<SearchResult> {
        let mut set = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let request = request.clone();
            set.spawn(async move {
                let name = adapter.name().to_string();
                (name, adapter.search(&request).await)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(hits))) => {
                    debug!(adapter = %name, hits = hits.len(), "adapter returned");
                    results.extend(hits.into_iter().map(|mut h| {
                        if h.source.is_empty() {
                            h.source = name.clone();
                        }
                        h
                    }));
                }
                Ok((name, Err(e))) => warn!(adapter = %name, error = %e, "adapter failed"),
                Err(e) => warn!(error = %e, "adapter task aborted"),
            }
        }
        results
    }

    async fn fetch_pages(
        &self,
        ranked: &[RankedResult],
        limit: usize,
        deadline: Instant,
    ) -> Pages {
        let mut pages = Pages::new();
        let Some(fetcher) = &self.fetcher else {
            return pages;
        };
        if Instant::now() >= deadline {
            debug!("soft target spent on search, skipping page fetches");
            return pages;
        }

        let mut set = JoinSet::new();
        for r in ranked.iter().take(limit) {
            let fetcher = fetcher.clone();
            let url = r.url.clone();
            let key = r.normalized_url.clone();
            set.spawn(async move { (key, fetcher.fetch(&url).await) });
        }
        loop {
            let joined = match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    debug!(pending = set.len(), "soft target reached, dropping page fetches");
                    set.abort_all();
                    break;
                }
            };
            match joined {
                Ok((key, Ok(page))) => {
                    pages.insert(key, page.content);
                }
                Ok((key, Err(e))) => debug!(url = %key, error = %e, "page fetch failed"),
                Err(e) => warn!(error = %e, "page fetch task aborted"),
            }
        }
        pages
    }
}

/// Source-quality topic for a task: its primary domain, else general.
pub fn topic_of(task: &ResearchTask) -> String {
    let text = match &task.context {
        Some(ctx) => format!("{} {ctx}", task.query),
        None => task.query.clone(),
    };
    primary_domain(&text).unwrap_or(GENERAL_TOPIC).to_string()
}
