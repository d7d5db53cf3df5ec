//! Background work the foreground event path hands off.
//!
//! - worker: persistence, delivery logging and disclosure refresh, one job at
//!   a time in arrival order. Trigger analysis goes to a per-session lane, so
//!   a slow oracle call holds up only its own session.
//! - task listener: admits completed findings into their sessions and
//!   releases in-flight claims
//! - sweeper: ends idle sessions and infers outcomes for their injections

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use scout_core::models::{ResearchFinding, ResearchRequest, ResearchTask, TriggerSource};
use scout_injection::{Admission, AdmitOptions, Delivery};
use scout_learning::recommend_by_rules;
use scout_observability::events;
use scout_session::{sweep_inactive, EntryKind};
use scout_tasks::TaskEvent;

use crate::runtime::Engines;

pub(crate) enum Job {
    /// A block went out; log it and move its task to injected.
    Delivered(Delivery),
    Persist {
        session_id: String,
    },
    /// Persist and refresh disclosure here, then decide in the session's lane
    /// whether to research.
    Analyze {
        session_id: String,
        kind: EntryKind,
    },
    Stop,
}

/// Analysis lanes, one per session with work in flight. Lanes run
/// concurrently; within a lane events are analyzed in arrival order.
struct Lanes {
    senders: HashMap<String, mpsc::UnboundedSender<EntryKind>>,
    tasks: JoinSet<()>,
}

impl Lanes {
    fn new() -> Self {
        Self {
            senders: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    fn dispatch(&mut self, engines: &Arc<Engines>, session_id: String, kind: EntryKind) {
        let kind = match self.senders.get(&session_id) {
            Some(lane) => match lane.send(kind) {
                Ok(()) => return,
                Err(mpsc::error::SendError(kind)) => kind,
            },
            None => kind,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive until the lane task below drops it.
        let _ = tx.send(kind);
        self.tasks.spawn(run_lane(engines.clone(), session_id.clone(), rx));
        self.senders.insert(session_id, tx);
    }

    /// Close lanes whose session has ended. Their queued work still runs.
    fn prune(&mut self, engines: &Engines) {
        self.senders.retain(|id, _| engines.sessions.contains(id));
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "analysis lane panicked");
            }
        }
    }

    /// Close every lane and wait for the work already queued on them.
    async fn drain(mut self) {
        self.senders.clear();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "analysis lane panicked");
            }
        }
    }
}

async fn run_lane(
    engines: Arc<Engines>,
    session_id: String,
    mut kinds: mpsc::UnboundedReceiver<EntryKind>,
) {
    while let Some(kind) = kinds.recv().await {
        engines.analyze(&session_id, kind).await;
    }
}

pub(crate) async fn run_worker(engines: Arc<Engines>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    let mut lanes = Lanes::new();
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Delivered(delivery) => engines.after_delivery(&delivery),
            Job::Persist { session_id } => engines.persist(&session_id),
            Job::Analyze { session_id, kind } => {
                engines.persist(&session_id);
                engines.refresh_disclosure(&session_id);
                lanes.prune(&engines);
                lanes.dispatch(&engines, session_id, kind);
            }
            Job::Stop => break,
        }
    }
    lanes.drain().await;
    debug!("background worker stopped");
}

pub(crate) async fn run_task_listener(
    engines: Arc<Engines>,
    mut task_events: broadcast::Receiver<TaskEvent>,
) {
    loop {
        match task_events.recv().await {
            Ok(TaskEvent::Completed { task, finding }) => {
                engines.on_task_completed(&task, &finding).await;
            }
            Ok(TaskEvent::Failed { task, error }) => {
                debug!(task_id = %task.id, error = %error, "task failed, claim released");
                engines.release_claim(&task);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "task listener lagged, events lost");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("task listener stopped");
}

pub(crate) async fn run_sweeper(engines: Arc<Engines>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        engines.sweep(Utc::now());
    }
}

impl Engines {
    fn persist(&self, session_id: &str) {
        if let Err(e) = self.sessions.persist(session_id) {
            warn!(session_id, error = %e, "session snapshot not written");
        }
    }

    fn after_delivery(&self, delivery: &Delivery) {
        if let Err(e) = self.injection.log_delivery(delivery) {
            warn!(
                session_id = %delivery.entry.session_id,
                error = %e,
                "injection log entry not written"
            );
        }
        if let Some(task_id) = &delivery.task_id {
            if let Err(e) = self.queue.mark_injected(task_id) {
                warn!(task_id = %task_id, error = %e, "task not marked injected");
            }
        }
        self.persist(&delivery.entry.session_id);
    }

    fn refresh_disclosure(&self, session_id: &str) {
        if let Err(e) = self.injection.refresh_disclosure(session_id) {
            warn!(session_id, error = %e, "disclosure not refreshed");
        }
    }

    /// Run the trigger pipeline and submit whatever it asks for.
    async fn analyze(&self, session_id: &str, kind: EntryKind) {
        let decision = self.trigger.evaluate(session_id, kind).await;
        if !decision.is_actionable() {
            debug!(session_id, reason = %decision.reasoning, "no research");
            return;
        }
        let Some(query) = decision.query.clone() else {
            return;
        };

        let threshold = self.dedup.config().inflight_similarity;
        if !self.dedup.inflight().try_claim(session_id, &query, threshold) {
            debug!(session_id, query = %query, "equivalent research already running");
            return;
        }

        let depth = decision
            .depth
            .unwrap_or_else(|| recommend_by_rules(&query).depth);
        let mut request = ResearchRequest::new(query.as_str(), depth, decision.source)
            .with_session(session_id)
            .with_priority(decision.priority)
            .with_context(decision.reasoning.as_str());
        if let Some(path) = self
            .sessions
            .snapshot(session_id)
            .and_then(|ctx| ctx.project_path)
        {
            request = request.with_project_path(path);
        }

        match self.queue.submit(&request) {
            Ok(task) => {
                self.sessions
                    .record_research(session_id, &query, Some(&task.id), decision.confidence);
                info!(
                    session_id,
                    task_id = %task.id,
                    source = decision.source.as_str(),
                    depth = depth.as_str(),
                    "research queued"
                );
            }
            Err(e) => {
                self.dedup.inflight().release(session_id, &query);
                warn!(session_id, query = %query, error = %e, "research not queued");
            }
        }
    }

    /// Offer a finding to the session that asked for it.
    async fn on_task_completed(&self, task: &ResearchTask, finding: &ResearchFinding) {
        self.release_claim(task);
        let Some(session_id) = task.session_id.as_deref() else {
            return;
        };
        let opts = AdmitOptions {
            skip_relevance_gate: task.trigger == TriggerSource::Manual,
            ..Default::default()
        };
        match self.injection.admit(session_id, finding, Some(task), opts).await {
            Admission::Queued { score, .. } => {
                debug!(session_id, task_id = %task.id, score = score.total, "finding admitted");
            }
            Admission::Rejected(reason) => {
                debug!(session_id, task_id = %task.id, ?reason, "finding not admitted");
            }
        }
    }

    /// Manual research never claims, so it never releases.
    fn release_claim(&self, task: &ResearchTask) {
        if task.trigger == TriggerSource::Manual {
            return;
        }
        if let Some(session_id) = &task.session_id {
            self.dedup.inflight().release(session_id, &task.query);
        }
    }

    /// End idle sessions, drop their per-session gate state, and score the
    /// injections they received. Returns the number of sessions ended.
    pub(crate) fn sweep(&self, now: DateTime<Utc>) -> usize {
        let threshold = self.sessions.config().stuck_threshold;
        let ended = sweep_inactive(&self.sessions, now);
        for end in &ended {
            let ctx = &end.context;
            self.trigger.forget_session(&ctx.id);
            self.injection.forget_session(&ctx.id);

            match self.learner.infer_session_outcomes(ctx, threshold) {
                Ok(outcomes) => {
                    for (inferred, record) in outcomes {
                        if !inferred.escalate {
                            continue;
                        }
                        let id = record.injection_id.as_str();
                        if let Err(e) = self.storage.mark_followup_injected(id) {
                            warn!(injection_id = id, error = %e, "followup flag not written");
                        }
                    }
                }
                Err(e) => warn!(session_id = %ctx.id, error = %e, "outcomes not inferred"),
            }
            events::session_ended(
                &ctx.id,
                ctx.analytics.tool_uses,
                ctx.analytics.injections_delivered,
            );
        }
        ended.len()
    }
}
