use chrono::{DateTime, Utc};

use crate::errors::ScoutResult;
use crate::models::{
    DepthOutcome, InjectionLogEntry, ResearchFinding, ResearchTask, SessionRecord,
    SourceQualityEntry, TaskStatus, TaskStats, UrlCacheEntry,
};

/// Tasks + findings + sessions + injection log + source quality + URL cache.
pub trait IResearchStorage: Send + Sync {
    // --- Tasks ---
    fn insert_task(&self, task: &ResearchTask) -> ScoutResult<()>;
    fn update_task(&self, task: &ResearchTask) -> ScoutResult<()>;
    fn get_task(&self, id: &str) -> ScoutResult<Option<ResearchTask>>;
    /// Newest first. `None` lists every status.
    fn list_tasks(&self, status: Option<TaskStatus>, limit: usize)
        -> ScoutResult<Vec<ResearchTask>>;
    fn task_stats(&self) -> ScoutResult<TaskStats>;
    /// Mark every `running` row failed with `reason`. Returns the count.
    fn recover_running_tasks(&self, reason: &str) -> ScoutResult<usize>;

    // --- Findings ---
    fn upsert_finding(&self, finding: &ResearchFinding) -> ScoutResult<()>;
    fn get_finding(&self, id: &str) -> ScoutResult<Option<ResearchFinding>>;
    /// Bump `last_accessed` to now.
    fn touch_finding(&self, id: &str) -> ScoutResult<()>;
    fn list_findings(&self, limit: usize) -> ScoutResult<Vec<ResearchFinding>>;
    /// Findings created at or after `since`, newest first.
    fn recent_findings(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> ScoutResult<Vec<ResearchFinding>>;

    // --- Sessions ---
    fn save_session(&self, record: &SessionRecord) -> ScoutResult<()>;
    fn get_session(&self, id: &str) -> ScoutResult<Option<SessionRecord>>;

    // --- Injection log ---
    fn insert_injection(&self, entry: &InjectionLogEntry) -> ScoutResult<()>;
    fn get_injection(&self, id: &str) -> ScoutResult<Option<InjectionLogEntry>>;
    fn injections_for_session(&self, session_id: &str) -> ScoutResult<Vec<InjectionLogEntry>>;
    fn record_effectiveness(&self, id: &str, score: f64, resolved: bool) -> ScoutResult<()>;
    fn mark_followup_injected(&self, id: &str) -> ScoutResult<()>;
    /// Depth and helpfulness of every scored injection whose finding is in `domain`.
    fn depth_outcomes(&self, domain: &str) -> ScoutResult<Vec<DepthOutcome>>;

    // --- Source quality ---
    /// Record one citation. `helpful_increment` is added to the helpful count.
    fn record_citation(
        &self,
        domain: &str,
        topic: &str,
        helpful_increment: f64,
    ) -> ScoutResult<SourceQualityEntry>;
    /// Move the helpful count of an existing row by `delta` without counting
    /// a new citation. `None` when the row does not exist.
    fn adjust_helpful(
        &self,
        domain: &str,
        topic: &str,
        delta: f64,
    ) -> ScoutResult<Option<SourceQualityEntry>>;
    fn get_source_quality(&self, domain: &str, topic: &str)
        -> ScoutResult<Option<SourceQualityEntry>>;
    fn top_sources(&self, topic: &str, limit: usize) -> ScoutResult<Vec<SourceQualityEntry>>;

    // --- URL cache ---
    /// Fresh entry for `normalized_url`, incrementing its hit count.
    /// An expired entry is deleted and `None` returned.
    fn cache_get(
        &self,
        normalized_url: &str,
        now: DateTime<Utc>,
    ) -> ScoutResult<Option<UrlCacheEntry>>;
    fn cache_put(&self, entry: &UrlCacheEntry) -> ScoutResult<()>;
    fn cache_purge_expired(&self, now: DateTime<Utc>) -> ScoutResult<usize>;
}
