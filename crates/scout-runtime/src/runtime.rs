//! ScoutRuntime: owns all engines, the background workers, and graceful
//! shutdown.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use scout_core::config::{ScoutConfig, SettingsPatch};
use scout_core::constants::VERSION;
use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::{
    DisclosureLevel, ResearchDepth, ResearchFinding, ResearchRequest, ResearchTask, TaskStatus,
    TriggerSource,
};
use scout_core::traits::IResearchStorage;
use scout_dedup::DedupEngine;
use scout_injection::{InjectionManager, RelevanceGate};
use scout_learning::{recommend_by_rules, ExplicitSignals, MetaLearner, OutcomeRecord};
use scout_observability::degradation::{self, SharedDegradations};
use scout_session::extraction::primary_domain;
use scout_session::{EntryKind, SessionManager, ToolUseEvent, UserPromptEvent};
use scout_storage::{CachingFetcher, StorageEngine};
use scout_tasks::{ResearchExecutor, Synthesizer, TaskEvent, TaskQueue};
use scout_tokens::TokenCounter;
use scout_trigger::TriggerEngine;

use crate::background::{run_sweeper, run_task_listener, run_worker, Job};
use crate::options::RuntimeOptions;
use crate::types::{EventResponse, ManualResearchRequest, RuntimeStatus, SessionStats};

/// Priority of deliberate requests that do not name one.
const MANUAL_PRIORITY: u8 = 7;

/// Every engine, shared with the background tasks.
pub(crate) struct Engines {
    pub(crate) config: RwLock<ScoutConfig>,
    pub(crate) storage: Arc<dyn IResearchStorage>,
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) dedup: Arc<DedupEngine>,
    pub(crate) trigger: TriggerEngine,
    pub(crate) learner: Arc<MetaLearner>,
    pub(crate) queue: TaskQueue,
    pub(crate) injection: InjectionManager,
    pub(crate) degradations: SharedDegradations,
    pub(crate) adapters: Vec<String>,
    pub(crate) oracle_available: bool,
}

impl Engines {
    pub(crate) fn config(&self) -> ScoutConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Push a configuration into every engine.
    fn apply(&self, config: &ScoutConfig) {
        self.sessions.update_config(config.session.clone());
        self.dedup.update_config(config.dedup.clone());
        self.trigger.update_config(config.trigger.clone());
        self.queue.update_config(config.tasks.clone());
        self.injection.update_config(config.injection.clone());
        self.learner.update_config(config.learning.clone());
    }
}

/// Receivers held until `start_background` hands them to their tasks.
struct Parked {
    jobs: mpsc::UnboundedReceiver<Job>,
    task_events: broadcast::Receiver<TaskEvent>,
}

pub struct ScoutRuntime {
    engines: Arc<Engines>,
    jobs: mpsc::UnboundedSender<Job>,
    parked: Mutex<Option<Parked>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    helpers: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl ScoutRuntime {
    /// Build every engine. Background work starts with `start_background`.
    pub fn new(opts: RuntimeOptions) -> ScoutResult<Self> {
        let config = match &opts.config_toml {
            Some(toml_str) => ScoutConfig::from_toml(toml_str)?,
            None => ScoutConfig::default(),
        };
        if opts.init_tracing && !scout_observability::init_tracing(&config.observability) {
            debug!("tracing subscriber already installed");
        }

        // Storage
        let db_path = opts
            .db_path
            .clone()
            .or_else(|| config.storage.db_path.as_ref().map(PathBuf::from));
        let storage: Arc<dyn IResearchStorage> = match &db_path {
            Some(path) => Arc::new(StorageEngine::open_with_config(path, &config.storage)?),
            None => Arc::new(StorageEngine::open_in_memory()?),
        };
        let degradations = degradation::shared();

        // Session, dedup, learning
        let sessions = Arc::new(SessionManager::with_storage(
            config.session.clone(),
            storage.clone(),
        ));
        let mut dedup = DedupEngine::new(storage.clone(), config.dedup.clone());
        if let Some(index) = opts.vector_index.clone() {
            dedup = dedup.with_vector_index(index);
        }
        let dedup = Arc::new(dedup);
        let learner = Arc::new(MetaLearner::new(storage.clone(), config.learning.clone()));

        // Trigger and relevance gate share the oracle
        let mut trigger =
            TriggerEngine::new(sessions.clone(), dedup.clone(), config.trigger.clone())
                .with_learner(learner.clone())
                .with_degradations(degradations.clone());
        let mut gate = RelevanceGate::new().with_degradations(degradations.clone());
        let synthesizer = match &opts.oracle {
            Some(oracle) => {
                trigger = trigger.with_oracle(oracle.clone());
                gate = gate.with_oracle(oracle.clone());
                Synthesizer::with_oracle(oracle.clone(), config.tasks.oracle_synthesis)
            }
            None => Synthesizer::extractive(),
        }
        .with_degradations(degradations.clone());

        // Tasks
        let mut executor = ResearchExecutor::new(storage.clone(), opts.adapters, synthesizer);
        if let Some(extractor) = opts.extractor {
            executor = executor.with_fetcher(CachingFetcher::new(storage.clone(), extractor));
        }
        let adapters = executor.adapter_names();
        let queue = TaskQueue::new(storage.clone(), Arc::new(executor), config.tasks.clone());

        // Injection
        let injection = InjectionManager::new(
            sessions.clone(),
            storage.clone(),
            TokenCounter::default(),
            config.injection.clone(),
        )
        .with_gate(gate);

        let (jobs, job_rx) = mpsc::unbounded_channel();
        let task_events = queue.subscribe();
        info!(
            adapters = adapters.len(),
            oracle = opts.oracle.is_some(),
            persistent = db_path.is_some(),
            "scout runtime built"
        );

        Ok(Self {
            engines: Arc::new(Engines {
                config: RwLock::new(config),
                storage,
                sessions,
                dedup,
                trigger,
                learner,
                queue,
                injection,
                degradations,
                adapters,
                oracle_available: opts.oracle.is_some(),
            }),
            jobs,
            parked: Mutex::new(Some(Parked {
                jobs: job_rx,
                task_events,
            })),
            worker: Mutex::new(None),
            helpers: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        })
    }

    // ── Events ──

    /// Record a user prompt and deliver any pending block. User prompts never
    /// trigger research.
    pub fn on_user_prompt(&self, event: UserPromptEvent) -> EventResponse {
        let sid = event.session_id.as_str();
        self.engines
            .sessions
            .add_user_prompt(sid, &event.prompt, event.project_path.as_deref());
        let injection = self.deliver(sid);
        self.send(Job::Persist {
            session_id: sid.to_string(),
        });
        EventResponse {
            session_id: event.session_id.clone(),
            injection,
            research_queued: false,
            queued_query: None,
            pending_injections: self.engines.sessions.pending_count(sid),
        }
    }

    /// Record a tool use, deliver any pending block, and hand analysis of the
    /// event to the background worker.
    pub fn on_tool_use(&self, event: ToolUseEvent) -> EventResponse {
        let sid = event.session_id.clone();
        self.engines.sessions.add_tool_use(&event);
        let injection = self.deliver(&sid);

        let queued_query = if self.engines.trigger.config().quick_analysis_enabled {
            self.engines
                .sessions
                .snapshot(&sid)
                .and_then(|ctx| self.engines.trigger.quick(&ctx))
                .and_then(|decision| decision.query)
        } else {
            None
        };
        let scheduled = self.send(Job::Analyze {
            session_id: sid.clone(),
            kind: EntryKind::ToolUse,
        });
        let research_queued = scheduled && queued_query.is_some();

        EventResponse {
            pending_injections: self.engines.sessions.pending_count(&sid),
            session_id: sid,
            injection,
            research_queued,
            queued_query,
        }
    }

    fn deliver(&self, session_id: &str) -> Option<String> {
        let delivery = self.engines.injection.deliver(session_id, Utc::now())?;
        let block = delivery.block.clone();
        self.send(Job::Delivered(delivery));
        Some(block)
    }

    fn send(&self, job: Job) -> bool {
        match self.jobs.send(job) {
            Ok(()) => true,
            Err(_) => {
                debug!("background worker stopped, job dropped");
                false
            }
        }
    }

    // ── Deliberate research ──

    /// Queue research on the host's behalf. The relevance gate is skipped
    /// when the finding is admitted into the named session.
    pub fn research(&self, request: ManualResearchRequest) -> ScoutResult<ResearchTask> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ScoutError::ValidationError(
                "research query must not be empty".into(),
            ));
        }
        let depth = match request.depth {
            Some(depth) => depth,
            None => self.recommend_depth(query),
        };

        let mut req = ResearchRequest::new(query, depth, TriggerSource::Manual)
            .with_priority(request.priority.unwrap_or(MANUAL_PRIORITY));
        if let Some(sid) = &request.session_id {
            req = req.with_session(sid.as_str());
        }
        if let Some(context) = &request.context {
            req = req.with_context(context.as_str());
        }
        if let Some(path) = &request.project_path {
            req = req.with_project_path(path.as_str());
        }

        let task = self.engines.queue.submit(&req)?;
        if let Some(sid) = &request.session_id {
            self.engines
                .sessions
                .record_research(sid, query, Some(&task.id), 1.0);
        }
        info!(task_id = %task.id, query, depth = depth.as_str(), "manual research queued");
        Ok(task)
    }

    /// Queue research and wait up to `timeout` for its finding.
    pub async fn research_and_wait(
        &self,
        request: ManualResearchRequest,
        timeout: Duration,
    ) -> ScoutResult<ResearchFinding> {
        let task = self.research(request)?;
        self.engines.queue.wait_for(&task.id, timeout).await
    }

    fn recommend_depth(&self, query: &str) -> ResearchDepth {
        match self
            .engines
            .learner
            .recommend_depth(query, primary_domain(query))
        {
            Ok(rec) => rec.depth,
            Err(e) => {
                warn!(error = %e, "depth history unavailable, using rules");
                recommend_by_rules(query).depth
            }
        }
    }

    // ── Introspection ──

    pub fn status(&self) -> ScoutResult<RuntimeStatus> {
        let degradations = self
            .engines
            .degradations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_degradations()
            .into_iter()
            .cloned()
            .collect();
        Ok(RuntimeStatus {
            version: VERSION,
            queue: self.engines.queue.queue_stats()?,
            active_sessions: self.engines.sessions.session_count(),
            adapters: self.engines.adapters.clone(),
            oracle_available: self.engines.oracle_available,
            background_running: self.running.load(Ordering::SeqCst),
            degradations,
        })
    }

    /// Live statistics for one session, `None` once it has ended.
    pub fn session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let ctx = self.engines.sessions.snapshot(session_id)?;
        let threshold = self.engines.sessions.config().stuck_threshold;
        Some(SessionStats {
            session_id: ctx.id.clone(),
            pending_injections: ctx.pending.len(),
            disclosure_level: ctx.disclosure_level,
            budget: self.engines.injection.usage(session_id),
            current_task: ctx.current_task.clone(),
            focus: ctx.stuck_indicator(threshold),
            topics: ctx.topics.iter().cloned().collect(),
            tech_stack: ctx.tech_stack.iter().cloned().collect(),
            research: ctx.research_history.iter().cloned().collect(),
            analytics: ctx.analytics,
        })
    }

    pub fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> ScoutResult<Vec<ResearchTask>> {
        self.engines.queue.list_tasks(status, limit)
    }

    pub fn get_task(&self, id: &str) -> ScoutResult<ResearchTask> {
        self.engines
            .queue
            .get_task(id)?
            .ok_or_else(|| ScoutError::TaskNotFound { id: id.to_string() })
    }

    pub fn list_findings(&self, limit: usize) -> ScoutResult<Vec<ResearchFinding>> {
        self.engines.storage.list_findings(limit)
    }

    pub fn get_finding(&self, id: &str) -> ScoutResult<ResearchFinding> {
        self.engines
            .storage
            .get_finding(id)?
            .ok_or_else(|| ScoutError::FindingNotFound { id: id.to_string() })
    }

    /// A stored finding rendered at `level`.
    pub fn finding_detail(&self, id: &str, level: DisclosureLevel) -> ScoutResult<String> {
        self.engines.injection.finding_detail(id, level)
    }

    // ── Settings & feedback ──

    pub fn settings(&self) -> ScoutConfig {
        self.engines.config()
    }

    /// Validate `patch` against the current settings and push the result
    /// into every engine. Nothing changes when validation fails.
    pub fn update_settings(&self, patch: SettingsPatch) -> ScoutResult<ScoutConfig> {
        let mut current = self
            .engines
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let next = patch.apply_to(&current)?;
        self.engines.apply(&next);
        *current = next.clone();
        info!(?patch, "settings updated");
        Ok(next)
    }

    pub fn record_feedback(
        &self,
        injection_id: &str,
        signals: ExplicitSignals,
    ) -> ScoutResult<OutcomeRecord> {
        self.engines.learner.record_outcome(injection_id, &signals)
    }

    // ── Lifecycle ──

    /// Recover the task table and spawn the background worker, the task
    /// listener and the session sweeper. Must run inside a tokio runtime.
    /// Calling it again while running is a no-op.
    pub fn start_background(&self) -> ScoutResult<()> {
        let handle = Handle::try_current().map_err(|_| {
            ScoutError::ConfigError("background workers need a tokio runtime".into())
        })?;
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let Some(parked) = self
            .parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            self.running.store(false, Ordering::SeqCst);
            return Err(ScoutError::ConfigError(
                "runtime was shut down and cannot restart".into(),
            ));
        };

        let recovered = self.engines.queue.recover_orphans()?;
        let resumed = self.engines.queue.resume_queued()?;

        let sweep_secs = self.engines.config().session.sweep_interval_secs.max(1);
        let sweep_every = Duration::from_secs(sweep_secs);
        let worker = handle.spawn(run_worker(self.engines.clone(), parked.jobs));
        let listener = handle.spawn(run_task_listener(
            self.engines.clone(),
            parked.task_events,
        ));
        let sweeper = handle.spawn(run_sweeper(self.engines.clone(), sweep_every));

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(worker);
        self.helpers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([listener, sweeper]);
        info!(recovered, resumed, "background workers started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting research, drain the background worker, stop the other
    /// tasks, and write every live session's snapshot.
    pub async fn shutdown(&self) {
        self.engines.queue.close();
        if self.running.swap(false, Ordering::SeqCst) {
            self.send(Job::Stop);
            let worker = self
                .worker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(worker) = worker {
                if let Err(e) = worker.await {
                    warn!(error = %e, "background worker ended abnormally");
                }
            }
            let helpers: Vec<JoinHandle<()>> = self
                .helpers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect();
            for helper in helpers {
                helper.abort();
            }
        }

        for sid in self.engines.sessions.session_ids() {
            if let Err(e) = self.engines.sessions.persist(&sid) {
                warn!(session_id = %sid, error = %e, "session snapshot not written at shutdown");
            }
        }
        info!("scout runtime shut down");
    }

    // ── Maintenance ──

    /// Run one sweep pass at `now` instead of waiting for the interval.
    /// Returns the number of sessions ended.
    pub fn sweep_now(&self, now: DateTime<Utc>) -> usize {
        self.engines.sweep(now)
    }
}
