//! TaskQueue: the single writer of research task status.
//!
//! At most `max_concurrent` tasks run at once; the rest wait in a heap
//! ordered by priority, then submission order. Each attempt races the depth's
//! hard timeout. A failed attempt goes back to the heap while retries remain,
//! otherwise the task is marked failed. Lifecycle events go out on a
//! broadcast channel; a slow subscriber lags rather than blocking the queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{info, warn, Instrument};

use scout_core::config::TaskConfig;
use scout_core::constants::ORPHANED_TASK_ERROR;
use scout_core::errors::{ScoutError, ScoutResult, TaskError};
use scout_core::models::{
    ResearchFinding, ResearchRequest, ResearchTask, TaskStats, TaskStatus,
};
use scout_core::traits::IResearchStorage;
use scout_observability::events;

use crate::events::TaskEvent;
use crate::executor::ResearchExecutor;

/// Queued rows reloaded by `resume_queued`.
const RESUME_LIMIT: usize = 1_000;

/// Heap entry: higher priority first, then lower sequence number.
struct Scheduled {
    priority: u8,
    seq: u64,
    task: ResearchTask,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct QueueState {
    pending: BinaryHeap<Scheduled>,
    running: usize,
    next_seq: u64,
}

impl QueueState {
    fn push(&mut self, task: ResearchTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            priority: task.priority,
            seq,
            task,
        });
    }
}

/// Snapshot for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStats {
    /// Persisted counts by status.
    pub counts: TaskStats,
    pub pending: usize,
    pub running: usize,
    pub max_concurrent: usize,
    pub closed: bool,
}

struct QueueInner {
    storage: Arc<dyn IResearchStorage>,
    executor: Arc<ResearchExecutor>,
    config: RwLock<TaskConfig>,
    state: Mutex<QueueState>,
    events: broadcast::Sender<TaskEvent>,
    closed: AtomicBool,
}

impl QueueInner {
    fn config(&self) -> TaskConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TaskEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn persist(&self, task: &ResearchTask) {
        if let Err(e) = self.storage.update_task(task) {
            warn!(
                task_id = %task.id,
                status = %task.status,
                error = %e,
                "task status not persisted"
            );
        }
    }
}

#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

impl TaskQueue {
    pub fn new(
        storage: Arc<dyn IResearchStorage>,
        executor: Arc<ResearchExecutor>,
        config: TaskConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        executor
            .synthesizer()
            .set_oracle_enabled(config.oracle_synthesis);
        Self {
            inner: Arc::new(QueueInner {
                storage,
                executor,
                config: RwLock::new(config),
                state: Mutex::new(QueueState::default()),
                events,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> TaskConfig {
        self.inner.config()
    }

    /// Takes effect for the next dispatch; a raised cap starts waiting tasks now.
    pub fn update_config(&self, config: TaskConfig) {
        self.inner
            .executor
            .synthesizer()
            .set_oracle_enabled(config.oracle_synthesis);
        *self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config;
        dispatch(&self.inner);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }

    // ── Submission ──

    /// Persist a queued task and schedule it. Must be called inside a tokio
    /// runtime for the task to start; otherwise it waits for the next dispatch.
    pub fn submit(&self, request: &ResearchRequest) -> ScoutResult<ResearchTask> {
        if self.is_closed() {
            return Err(TaskError::QueueClosed.into());
        }
        let task = ResearchTask::from_request(request);
        self.inner.storage.insert_task(&task)?;
        info!(
            task_id = %task.id,
            query = %task.query,
            depth = %task.depth,
            priority = task.priority,
            trigger = task.trigger.as_str(),
            "research task queued"
        );
        self.inner.state().push(task.clone());
        self.inner.emit(TaskEvent::Queued { task: task.clone() });
        dispatch(&self.inner);
        Ok(task)
    }

    /// Mark tasks left `running` by a previous process as failed.
    pub fn recover_orphans(&self) -> ScoutResult<usize> {
        let recovered = self
            .inner
            .storage
            .recover_running_tasks(ORPHANED_TASK_ERROR)?;
        if recovered > 0 {
            warn!(recovered, "orphaned running tasks marked failed");
        }
        Ok(recovered)
    }

    /// Schedule tasks persisted as `queued` by a previous process.
    pub fn resume_queued(&self) -> ScoutResult<usize> {
        let mut queued = self
            .inner
            .storage
            .list_tasks(Some(TaskStatus::Queued), RESUME_LIMIT)?;
        // Listing is newest first; keep submission order.
        queued.reverse();
        let count = queued.len();
        {
            let mut state = self.inner.state();
            for task in queued {
                state.push(task);
            }
        }
        if count > 0 {
            info!(count, "resumed persisted queued tasks");
            dispatch(&self.inner);
        }
        Ok(count)
    }

    /// Refuse new submissions. Running tasks finish; waiting ones stay queued
    /// in storage for `resume_queued`.
    pub fn close(&self) {
        self.inner.closed.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(AtomicOrdering::SeqCst)
    }

    // ── Introspection ──

    pub fn get_task(&self, id: &str) -> ScoutResult<Option<ResearchTask>> {
        self.inner.storage.get_task(id)
    }

    pub fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> ScoutResult<Vec<ResearchTask>> {
        self.inner.storage.list_tasks(status, limit)
    }

    pub fn queue_stats(&self) -> ScoutResult<QueueStats> {
        let counts = self.inner.storage.task_stats()?;
        let (pending, running) = {
            let state = self.inner.state();
            (state.pending.len(), state.running)
        };
        Ok(QueueStats {
            counts,
            pending,
            running,
            max_concurrent: self.inner.config().max_concurrent,
            closed: self.is_closed(),
        })
    }

    /// Move a completed task to `injected`.
    pub fn mark_injected(&self, task_id: &str) -> ScoutResult<()> {
        let mut task = self
            .get_task(task_id)?
            .ok_or_else(|| ScoutError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        if task.status == TaskStatus::Injected {
            return Ok(());
        }
        advance(&mut task, TaskStatus::Injected)?;
        self.inner.storage.update_task(&task)
    }

    /// Wait until `task_id` settles. Completed yields its finding; a final
    /// failure or the timeout yields an error.
    pub async fn wait_for(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> ScoutResult<ResearchFinding> {
        let mut rx = self.subscribe();
        if let Some(done) = self.settled(task_id)? {
            return done;
        }

        let wait = self.next_outcome(&mut rx, task_id);
        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(TaskError::WaitTimeout {
                task_id: task_id.to_string(),
                after_secs: timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn next_outcome(
        &self,
        rx: &mut broadcast::Receiver<TaskEvent>,
        task_id: &str,
    ) -> ScoutResult<ResearchFinding> {
        loop {
            match rx.recv().await {
                Ok(TaskEvent::Completed { task, finding }) if task.id == task_id => {
                    return Ok(finding);
                }
                Ok(TaskEvent::Failed { task, error }) if task.id == task_id => {
                    return Err(TaskError::Failed {
                        task_id: task.id,
                        error,
                    }
                    .into());
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "task event receiver lagged");
                    if let Some(done) = self.settled(task_id)? {
                        return done;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(TaskError::QueueClosed.into());
                }
            }
        }
    }

    /// The final outcome of a task if it has one.
    fn settled(&self, task_id: &str) -> ScoutResult<Option<ScoutResult<ResearchFinding>>> {
        let task = self
            .get_task(task_id)?
            .ok_or_else(|| ScoutError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        Ok(match task.status {
            TaskStatus::Completed | TaskStatus::Injected => {
                let finding_id = task.result.unwrap_or_default();
                Some(
                    self.inner
                        .storage
                        .get_finding(&finding_id)?
                        .ok_or(ScoutError::FindingNotFound { id: finding_id }),
                )
            }
            TaskStatus::Failed => Some(Err(TaskError::Failed {
                task_id: task.id,
                error: task.error.unwrap_or_default(),
            }
            .into())),
            TaskStatus::Queued | TaskStatus::Running => None,
        })
    }
}

/// Forward-only status change.
fn advance(task: &mut ResearchTask, next: TaskStatus) -> ScoutResult<()> {
    if !task.status.can_transition_to(next) {
        return Err(ScoutError::InvalidTransition {
            id: task.id.clone(),
            from: task.status.to_string(),
            to: next.to_string(),
        });
    }
    task.status = next;
    Ok(())
}

/// Start waiting tasks up to the concurrency cap.
fn dispatch(inner: &Arc<QueueInner>) {
    if inner.closed.load(AtomicOrdering::SeqCst) {
        return;
    }
    let Ok(handle) = Handle::try_current() else {
        warn!("no tokio runtime; tasks stay queued until the next dispatch");
        return;
    };
    let cap = inner.config().max_concurrent.max(1);
    let batch: Vec<ResearchTask> = {
        let mut state = inner.state();
        let mut batch = Vec::new();
        while state.running < cap {
            let Some(next) = state.pending.pop() else {
                break;
            };
            state.running += 1;
            batch.push(next.task);
        }
        batch
    };

    for task in batch {
        let inner = Arc::clone(inner);
        handle.spawn(async move {
            let span = scout_observability::research_span!(task.id, task.depth);
            run_attempt(&inner, task).instrument(span).await;
            inner.state().running -= 1;
            dispatch(&inner);
        });
    }
}

async fn run_attempt(inner: &Arc<QueueInner>, mut task: ResearchTask) {
    if let Err(e) = advance(&mut task, TaskStatus::Running) {
        warn!(error = %e, "task not runnable");
        return;
    }
    task.started_at = Some(Utc::now());
    task.error = None;
    inner.persist(&task);
    inner.emit(TaskEvent::Started { task: task.clone() });

    let limit = task.depth.budget().hard_timeout;
    let started = Instant::now();
    let outcome = match tokio::time::timeout(limit, inner.executor.execute(&task)).await {
        Ok(result) => result,
        Err(_) => Err(TaskError::Timeout {
            task_id: task.id.clone(),
            after_secs: limit.as_secs(),
        }
        .into()),
    };
    task.attempts += 1;
    let outcome = outcome.and_then(|finding| {
        inner.storage.upsert_finding(&finding)?;
        Ok(finding)
    });

    match outcome {
        Ok(finding) => {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            task.result = Some(finding.id.clone());
            inner.persist(&task);
            events::task_completed(
                &task.id,
                &finding.id,
                finding.sources.len(),
                started.elapsed().as_millis() as u64,
            );
            inner.emit(TaskEvent::Completed { task, finding });
        }
        Err(e) => {
            let error = e.to_string();
            let retries = inner.config().max_retries;
            if task.attempts <= retries && !inner.closed.load(AtomicOrdering::SeqCst) {
                info!(
                    task_id = %task.id,
                    attempts = task.attempts,
                    error = %error,
                    "retrying research task"
                );
                task.status = TaskStatus::Queued;
                task.error = Some(error);
                inner.persist(&task);
                inner.state().push(task);
            } else {
                task.status = TaskStatus::Failed;
                task.completed_at = Some(Utc::now());
                task.error = Some(error.clone());
                inner.persist(&task);
                events::task_failed(&task.id, &error, task.attempts);
                inner.emit(TaskEvent::Failed { task, error });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::models::{ResearchDepth, TriggerSource};

    fn task(priority: u8) -> ResearchTask {
        ResearchTask::from_request(
            &ResearchRequest::new("q", ResearchDepth::Quick, TriggerSource::Manual)
                .with_priority(priority),
        )
    }

    #[test]
    fn heap_pops_priority_then_fifo() {
        let mut state = QueueState::default();
        state.push(task(3));
        state.push(task(9));
        state.push(task(3));
        state.push(task(5));
        let order: Vec<(u8, u64)> = std::iter::from_fn(|| state.pending.pop())
            .map(|s| (s.priority, s.seq))
            .collect();
        assert_eq!(order, vec![(9, 1), (5, 3), (3, 0), (3, 2)]);
    }

    #[test]
    fn transitions_are_forward_only() {
        let mut t = task(5);
        assert!(advance(&mut t, TaskStatus::Completed).is_err());
        advance(&mut t, TaskStatus::Running).unwrap();
        advance(&mut t, TaskStatus::Completed).unwrap();
        advance(&mut t, TaskStatus::Injected).unwrap();
        assert!(advance(&mut t, TaskStatus::Running).is_err());
    }
}
