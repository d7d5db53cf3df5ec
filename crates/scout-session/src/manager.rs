//! SessionManager: concurrent per-session access via DashMap.
//!
//! The manager is the only writer of a `SessionContext`. Every read hands out
//! a clone; nothing outside this module holds a reference into the map.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use scout_core::config::SessionConfig;
use scout_core::errors::ScoutResult;
use scout_core::models::{DisclosureLevel, PendingInjection};
use scout_core::traits::IResearchStorage;

use crate::analytics::SessionAnalytics;
use crate::context::{ResearchRecord, SessionContext};
use crate::conversation::ToolUseEvent;
use crate::extraction::ErrorSignature;
use crate::focus::StuckIndicator;
use crate::strategic;

/// What `end_session` removed, and whether its final snapshot was written.
#[derive(Debug)]
pub struct SessionEnd {
    pub context: SessionContext,
    pub persisted: ScoutResult<()>,
}

pub struct SessionManager {
    sessions: Arc<DashMap<String, SessionContext>>,
    config: RwLock<SessionConfig>,
    storage: Option<Arc<dyn IResearchStorage>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            config: RwLock::new(config),
            storage: None,
        }
    }

    /// Manager that writes snapshots to `storage` on `persist` and `end_session`.
    pub fn with_storage(config: SessionConfig, storage: Arc<dyn IResearchStorage>) -> Self {
        Self {
            storage: Some(storage),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(&self, config: SessionConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    // ── Ingestion ──

    pub fn add_user_prompt(&self, session_id: &str, content: &str, project_path: Option<&str>) {
        let config = self.config();
        let now = Utc::now();
        let mut ctx = self.entry(session_id, project_path, now);
        ctx.apply_user_prompt(content, &config, now);
    }

    /// Fold a tool use into its session. Returns the error signatures it produced.
    pub fn add_tool_use(&self, event: &ToolUseEvent) -> Vec<ErrorSignature> {
        let config = self.config();
        let now = Utc::now();
        let mut ctx = self.entry(&event.session_id, event.project_path.as_deref(), now);
        ctx.apply_tool_use(event, &config, now)
    }

    /// Get or create. Ended sessions are gone from the map, so an event for
    /// their id starts a fresh context.
    fn entry(
        &self,
        session_id: &str,
        project_path: Option<&str>,
        now: DateTime<Utc>,
    ) -> dashmap::mapref::one::RefMut<'_, String, SessionContext> {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "session created");
                SessionContext::new(session_id, project_path.map(str::to_string), now)
            });
        if entry.project_path.is_none() {
            entry.project_path = project_path.map(str::to_string);
        }
        entry
    }

    fn update<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionContext) -> R) -> Option<R> {
        self.sessions
            .get_mut(session_id)
            .map(|mut ctx| f(ctx.value_mut()))
    }

    fn read<R>(&self, session_id: &str, f: impl FnOnce(&SessionContext) -> R) -> Option<R> {
        self.sessions.get(session_id).map(|ctx| f(ctx.value()))
    }

    // ── Focus & strategic ──

    pub fn stuck_indicator(&self, session_id: &str) -> Option<StuckIndicator> {
        let threshold = self.config().stuck_threshold;
        self.read(session_id, |ctx| ctx.stuck_indicator(threshold))
    }

    pub fn is_stuck(&self, session_id: &str) -> bool {
        self.stuck_indicator(session_id)
            .is_some_and(|s| s.is_stuck)
    }

    pub fn should_trigger_strategic_analysis(&self, session_id: &str) -> bool {
        let config = self.config();
        let now = Utc::now();
        self.read(session_id, |ctx| strategic::should_trigger(ctx, &config, now))
            .unwrap_or(false)
    }

    pub fn mark_strategic_analysis_performed(&self, session_id: &str) {
        self.update(session_id, |ctx| strategic::mark_performed(ctx, Utc::now()));
    }

    pub fn complementary_suggestions(&self, session_id: &str) -> Vec<String> {
        self.read(session_id, strategic::complementary_suggestions)
            .unwrap_or_default()
    }

    /// Record that passive analysis ran for this session now.
    pub fn mark_analyzed(&self, session_id: &str) {
        self.update(session_id, |ctx| ctx.last_analyzed = Some(Utc::now()));
    }

    // ── Pending injections ──

    /// Queue content for the next event. False when the session is unknown.
    pub fn queue_injection(&self, session_id: &str, injection: PendingInjection) -> bool {
        self.update(session_id, |ctx| ctx.queue_injection(injection))
            .is_some()
    }

    /// Highest priority, then oldest.
    pub fn pop_injection(&self, session_id: &str) -> Option<PendingInjection> {
        self.update(session_id, SessionContext::pop_injection)
            .flatten()
    }

    pub fn pending_count(&self, session_id: &str) -> usize {
        self.read(session_id, |ctx| ctx.pending.len())
            .unwrap_or(0)
    }

    // ── Research history ──

    pub fn record_research(
        &self,
        session_id: &str,
        query: &str,
        task_id: Option<&str>,
        confidence: f64,
    ) {
        let cap = self.config().research_history;
        self.update(session_id, |ctx| {
            ctx.record_research(
                ResearchRecord {
                    query: query.to_string(),
                    task_id: task_id.map(str::to_string),
                    at: Utc::now(),
                    injected: false,
                    confidence,
                },
                cap,
            )
        });
    }

    pub fn mark_research_injected(&self, session_id: &str, task_id: &str) -> bool {
        self.update(session_id, |ctx| ctx.mark_research_injected(task_id))
            .unwrap_or(false)
    }

    /// Count a delivered block against the session's analytics.
    pub fn record_delivery(&self, session_id: &str, tokens: usize) {
        self.update(session_id, |ctx| ctx.analytics.record_delivery(tokens));
    }

    // ── Disclosure ──

    pub fn disclosure_level(&self, session_id: &str) -> DisclosureLevel {
        self.read(session_id, |ctx| ctx.disclosure_level)
            .unwrap_or_default()
    }

    pub fn set_disclosure_level(&self, session_id: &str, level: DisclosureLevel) {
        self.update(session_id, |ctx| ctx.disclosure_level = level);
    }

    // ── Introspection ──

    pub fn snapshot(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions.get(session_id).map(|r| r.clone())
    }

    pub fn analytics(&self, session_id: &str) -> Option<SessionAnalytics> {
        self.read(session_id, |ctx| ctx.analytics.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Ids of sessions idle longer than the configured timeout at `now`.
    pub fn idle_sessions(&self, now: DateTime<Utc>) -> Vec<String> {
        let timeout = self.idle_timeout_secs();
        self.sessions
            .iter()
            .filter(|r| is_idle(r.value(), now, timeout))
            .map(|r| r.key().clone())
            .collect()
    }

    fn idle_timeout_secs(&self) -> i64 {
        self.config().inactivity_timeout_secs as i64
    }

    // ── Lifecycle ──

    /// Write the session's current snapshot. A no-op without storage.
    pub fn persist(&self, session_id: &str) -> ScoutResult<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let Some(record) = self.read(session_id, |ctx| ctx.to_record(None)) else {
            return Ok(());
        };
        storage.save_session(&record)
    }

    /// Remove the session and write its final snapshot. The context is never
    /// reloaded; a later event with this id starts over.
    pub fn end_session(&self, session_id: &str) -> Option<SessionEnd> {
        let (_, context) = self.sessions.remove(session_id)?;
        Some(self.finish(session_id, context))
    }

    /// End the session only if it is still idle at `now`. The check and the
    /// removal hold the same shard lock, so an event that lands after the
    /// idle scan keeps the session alive.
    pub fn end_session_if_idle(&self, session_id: &str, now: DateTime<Utc>) -> Option<SessionEnd> {
        let timeout = self.idle_timeout_secs();
        let (_, context) = self
            .sessions
            .remove_if(session_id, |_, ctx| is_idle(ctx, now, timeout))?;
        Some(self.finish(session_id, context))
    }

    fn finish(&self, session_id: &str, mut context: SessionContext) -> SessionEnd {
        context.active = false;
        let persisted = match &self.storage {
            Some(storage) => storage.save_session(&context.to_record(Some(Utc::now()))),
            None => Ok(()),
        };
        if let Err(e) = &persisted {
            warn!(session_id, error = %e, "final session snapshot not written");
        }
        info!(
            session_id,
            tool_uses = context.analytics.tool_uses,
            injections = context.analytics.injections_delivered,
            "session ended"
        );
        SessionEnd { context, persisted }
    }
}

fn is_idle(ctx: &SessionContext, now: DateTime<Utc>, timeout_secs: i64) -> bool {
    (now - ctx.last_activity).num_seconds() > timeout_secs
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
