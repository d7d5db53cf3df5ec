//! StorageEngine: owns the connection pool and implements `IResearchStorage`.

use std::path::Path;

use chrono::{DateTime, Utc};

use scout_core::config::StorageConfig;
use scout_core::errors::ScoutResult;
use scout_core::models::{
    DepthOutcome, InjectionLogEntry, ResearchFinding, ResearchTask, SessionRecord,
    SourceQualityEntry, TaskStats, TaskStatus, UrlCacheEntry,
};
use scout_core::traits::IResearchStorage;

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{
    finding_ops, injection_ops, session_ops, source_quality_ops, task_ops, url_cache_ops,
};
use crate::recovery;

pub struct StorageEngine {
    pool: ConnectionPool,
    /// File-backed mode reads through the pool. In-memory mode reads through
    /// the writer, since in-memory readers are separate databases.
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a file-backed store with default pool settings.
    pub fn open(path: &Path) -> ScoutResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> ScoutResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size, config.busy_timeout_ms)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        Ok(engine)
    }

    pub fn open_in_memory() -> ScoutResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> ScoutResult<()> {
        self.pool.writer.with_conn(|conn| {
            let applied = migrations::run_migrations(conn)?;
            if applied > 0 {
                tracing::info!(applied, "storage schema migrated");
            }
            Ok(())
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn schema_version(&self) -> ScoutResult<u32> {
        self.with_reader(migrations::current_version)
    }

    fn with_reader<F, T>(&self, f: F) -> ScoutResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> ScoutResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }
}

impl IResearchStorage for StorageEngine {
    fn insert_task(&self, task: &ResearchTask) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| task_ops::insert_task(conn, task))
    }

    fn update_task(&self, task: &ResearchTask) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| task_ops::update_task(conn, task))
    }

    fn get_task(&self, id: &str) -> ScoutResult<Option<ResearchTask>> {
        self.with_reader(|conn| task_ops::get_task(conn, id))
    }

    fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> ScoutResult<Vec<ResearchTask>> {
        self.with_reader(|conn| task_ops::list_tasks(conn, status, limit))
    }

    fn task_stats(&self) -> ScoutResult<TaskStats> {
        self.with_reader(task_ops::task_stats)
    }

    fn recover_running_tasks(&self, reason: &str) -> ScoutResult<usize> {
        self.pool
            .writer
            .with_conn(|conn| recovery::fail_running_tasks(conn, reason))
    }

    fn upsert_finding(&self, finding: &ResearchFinding) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| finding_ops::upsert_finding(conn, finding))
    }

    fn get_finding(&self, id: &str) -> ScoutResult<Option<ResearchFinding>> {
        self.with_reader(|conn| finding_ops::get_finding(conn, id))
    }

    fn touch_finding(&self, id: &str) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| finding_ops::touch_finding(conn, id, Utc::now()))
    }

    fn list_findings(&self, limit: usize) -> ScoutResult<Vec<ResearchFinding>> {
        self.with_reader(|conn| finding_ops::list_findings(conn, limit))
    }

    fn recent_findings(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> ScoutResult<Vec<ResearchFinding>> {
        self.with_reader(|conn| finding_ops::recent_findings(conn, since, limit))
    }

    fn save_session(&self, record: &SessionRecord) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| session_ops::save_session(conn, record))
    }

    fn get_session(&self, id: &str) -> ScoutResult<Option<SessionRecord>> {
        self.with_reader(|conn| session_ops::get_session(conn, id))
    }

    fn insert_injection(&self, entry: &InjectionLogEntry) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| injection_ops::insert_injection(conn, entry))
    }

    fn get_injection(&self, id: &str) -> ScoutResult<Option<InjectionLogEntry>> {
        self.with_reader(|conn| injection_ops::get_injection(conn, id))
    }

    fn injections_for_session(&self, session_id: &str) -> ScoutResult<Vec<InjectionLogEntry>> {
        self.with_reader(|conn| injection_ops::injections_for_session(conn, session_id))
    }

    fn record_effectiveness(&self, id: &str, score: f64, resolved: bool) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| injection_ops::record_effectiveness(conn, id, score, resolved))
    }

    fn mark_followup_injected(&self, id: &str) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| injection_ops::mark_followup_injected(conn, id))
    }

    fn depth_outcomes(&self, domain: &str) -> ScoutResult<Vec<DepthOutcome>> {
        self.with_reader(|conn| injection_ops::depth_outcomes(conn, domain))
    }

    fn record_citation(
        &self,
        domain: &str,
        topic: &str,
        helpful_increment: f64,
    ) -> ScoutResult<SourceQualityEntry> {
        self.pool.writer.with_conn(|conn| {
            source_quality_ops::record_citation(conn, domain, topic, helpful_increment, Utc::now())
        })
    }

    fn adjust_helpful(
        &self,
        domain: &str,
        topic: &str,
        delta: f64,
    ) -> ScoutResult<Option<SourceQualityEntry>> {
        self.pool
            .writer
            .with_conn(|conn| source_quality_ops::adjust_helpful(conn, domain, topic, delta))
    }

    fn get_source_quality(
        &self,
        domain: &str,
        topic: &str,
    ) -> ScoutResult<Option<SourceQualityEntry>> {
        self.with_reader(|conn| source_quality_ops::get_source_quality(conn, domain, topic))
    }

    fn top_sources(&self, topic: &str, limit: usize) -> ScoutResult<Vec<SourceQualityEntry>> {
        self.with_reader(|conn| source_quality_ops::top_sources(conn, topic, limit))
    }

    // Cache reads mutate (hit count, eviction), so they take the writer.
    fn cache_get(
        &self,
        normalized_url: &str,
        now: DateTime<Utc>,
    ) -> ScoutResult<Option<UrlCacheEntry>> {
        self.pool
            .writer
            .with_conn(|conn| url_cache_ops::cache_get(conn, normalized_url, now))
    }

    fn cache_put(&self, entry: &UrlCacheEntry) -> ScoutResult<()> {
        self.pool
            .writer
            .with_conn(|conn| url_cache_ops::cache_put(conn, entry))
    }

    fn cache_purge_expired(&self, now: DateTime<Utc>) -> ScoutResult<usize> {
        self.pool
            .writer
            .with_conn(|conn| url_cache_ops::cache_purge_expired(conn, now))
    }
}
