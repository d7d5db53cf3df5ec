use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use scout_core::config::TaskConfig;
use scout_core::constants::ORPHANED_TASK_ERROR;
use scout_core::errors::{ScoutError, ScoutResult, TaskError};
use scout_core::models::{
    ExtractedContent, ResearchDepth, ResearchRequest, ResearchTask, SearchRequest, SearchResult,
    TaskStatus, TriggerSource,
};
use scout_core::traits::{IContentExtractor, IResearchStorage, ISearchAdapter};
use scout_storage::{CachingFetcher, StorageEngine};
use scout_tasks::{ResearchExecutor, Synthesizer, TaskEvent, TaskQueue};

const WAIT: Duration = Duration::from_secs(10);

/// Adapter returning one fixed page per query, optionally after a delay.
struct StubAdapter {
    name: &'static str,
    url: &'static str,
    delay: Duration,
    fail: bool,
    empty: bool,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubAdapter {
    fn new(name: &'static str, url: &'static str) -> Self {
        Self {
            name,
            url,
            delay: Duration::ZERO,
            fail: false,
            empty: false,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn empty(mut self) -> Self {
        self.empty = true;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ISearchAdapter for StubAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, request: &SearchRequest) -> ScoutResult<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.query.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(ScoutError::AdapterError {
                adapter: self.name.to_string(),
                reason: "HTTP 503".to_string(),
            });
        }
        if self.empty {
            return Ok(Vec::new());
        }
        Ok(vec![SearchResult {
            title: format!("{} result", self.name),
            url: self.url.to_string(),
            snippet: "Use tokio::time::interval with MissedTickBehavior::Delay after stalls."
                .to_string(),
            source: self.name.to_string(),
            relevance: Some(0.8),
        }])
    }
}

struct CountingExtractor {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingExtractor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }
}

#[async_trait]
impl IContentExtractor for CountingExtractor {
    async fn extract(&self, url: &str) -> ScoutResult<ExtractedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ExtractedContent {
            url: url.to_string(),
            title: Some("Interval docs".to_string()),
            content: "Intervals burst missed ticks by default in tokio. \
                      Setting the missed tick behavior to Delay spaces them out again."
                .to_string(),
            from_cache: false,
        })
    }
}

fn storage() -> Arc<dyn IResearchStorage> {
    Arc::new(StorageEngine::open_in_memory().unwrap())
}

fn queue_with(
    storage: Arc<dyn IResearchStorage>,
    adapters: Vec<Arc<dyn ISearchAdapter>>,
    config: TaskConfig,
) -> TaskQueue {
    let executor = ResearchExecutor::new(storage.clone(), adapters, Synthesizer::extractive());
    TaskQueue::new(storage, Arc::new(executor), config)
}

fn request(query: &str) -> ResearchRequest {
    ResearchRequest::new(query, ResearchDepth::Quick, TriggerSource::Manual)
}

fn config(max_concurrent: usize, max_retries: u32) -> TaskConfig {
    TaskConfig {
        max_concurrent,
        max_retries,
        ..TaskConfig::default()
    }
}

// ── Lifecycle ──

#[tokio::test]
async fn submitted_task_completes_with_persisted_finding() {
    let storage = storage();
    let adapter = Arc::new(StubAdapter::new("docs", "https://docs.rs/tokio/time"));
    let queue = queue_with(storage.clone(), vec![adapter], TaskConfig::default());
    let mut rx = queue.subscribe();

    let task = queue.submit(&request("tokio interval drift")).unwrap();
    assert_eq!(task.status, TaskStatus::Queued);
    let finding = queue.wait_for(&task.id, WAIT).await.unwrap();

    let stored = queue.get_task(&task.id).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.attempts, 1);
    assert_eq!(stored.result.as_deref(), Some(finding.id.as_str()));
    assert!(stored.started_at.is_some() && stored.completed_at.is_some());
    assert!(storage.get_finding(&finding.id).unwrap().is_some());
    assert_eq!(finding.task_id.as_deref(), Some(task.id.as_str()));

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    assert_eq!(names, vec!["queued", "started", "completed"]);
}

#[tokio::test]
async fn completed_task_can_be_marked_injected_once() {
    let adapter = Arc::new(StubAdapter::new("docs", "https://docs.rs/a"));
    let queue = queue_with(storage(), vec![adapter], TaskConfig::default());
    let task = queue.submit(&request("serde flatten enum")).unwrap();
    queue.wait_for(&task.id, WAIT).await.unwrap();

    queue.mark_injected(&task.id).unwrap();
    queue.mark_injected(&task.id).unwrap();
    let stored = queue.get_task(&task.id).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Injected);

    // A settled task still resolves to its finding.
    assert!(queue.wait_for(&task.id, WAIT).await.is_ok());
}

#[tokio::test]
async fn unknown_task_cannot_be_awaited() {
    let queue = queue_with(storage(), Vec::new(), TaskConfig::default());
    let err = queue.wait_for("missing", WAIT).await.unwrap_err();
    assert!(matches!(err, ScoutError::TaskNotFound { .. }));
}

// ── Scheduling ──

#[tokio::test]
async fn running_tasks_never_exceed_the_cap() {
    let adapter = Arc::new(
        StubAdapter::new("docs", "https://docs.rs/a").slow(Duration::from_millis(40)),
    );
    let queue = queue_with(storage(), vec![adapter.clone()], config(2, 0));

    let tasks: Vec<ResearchTask> = (0..5)
        .map(|i| queue.submit(&request(&format!("query number {i}"))).unwrap())
        .collect();
    let stats = queue.queue_stats().unwrap();
    assert!(stats.running <= 2);
    assert_eq!(stats.pending + stats.running, 5);

    for task in &tasks {
        queue.wait_for(&task.id, WAIT).await.unwrap();
    }
    assert_eq!(adapter.max_active.load(Ordering::SeqCst), 2);
    assert_eq!(queue.queue_stats().unwrap().counts.completed, 5);
}

#[tokio::test]
async fn higher_priority_runs_first_then_fifo() {
    let adapter = Arc::new(
        StubAdapter::new("docs", "https://docs.rs/a").slow(Duration::from_millis(20)),
    );
    let queue = queue_with(storage(), vec![adapter.clone()], config(1, 0));

    let ids: Vec<String> = [("blocker", 5), ("low", 2), ("high", 9), ("mid a", 5), ("mid b", 5)]
        .into_iter()
        .map(|(q, p)| queue.submit(&request(q).with_priority(p)).unwrap().id)
        .collect();
    for id in &ids {
        queue.wait_for(id, WAIT).await.unwrap();
    }
    assert_eq!(adapter.seen(), vec!["blocker", "high", "mid a", "mid b", "low"]);
}

#[tokio::test]
async fn closed_queue_refuses_submissions() {
    let queue = queue_with(storage(), Vec::new(), TaskConfig::default());
    queue.close();
    let err = queue.submit(&request("anything")).unwrap_err();
    assert!(matches!(err, ScoutError::TaskError(TaskError::QueueClosed)));
    assert!(queue.queue_stats().unwrap().closed);
}

// ── Failure handling ──

#[tokio::test]
async fn empty_pool_retries_then_fails() {
    let adapter = Arc::new(StubAdapter::new("docs", "https://docs.rs/a").empty());
    let queue = queue_with(storage(), vec![adapter.clone()], config(2, 1));
    let mut rx = queue.subscribe();

    let task = queue.submit(&request("nothing matches this")).unwrap();
    let err = queue.wait_for(&task.id, WAIT).await.unwrap_err();
    match err {
        ScoutError::TaskError(TaskError::Failed { task_id, error }) => {
            assert_eq!(task_id, task.id);
            assert!(error.contains("no results"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = queue.get_task(&task.id).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.attempts, 2);
    assert_eq!(adapter.calls(), 2);

    let mut failed = 0;
    while let Ok(event) = rx.try_recv() {
        if let TaskEvent::Failed { .. } = event {
            failed += 1;
        }
    }
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn failing_adapter_does_not_sink_the_task() {
    let good = Arc::new(StubAdapter::new("docs", "https://docs.rs/a"));
    let bad = Arc::new(StubAdapter::new("qa", "https://stackoverflow.com/q/1").failing());
    let queue = queue_with(storage(), vec![bad.clone(), good], TaskConfig::default());

    let task = queue.submit(&request("axum extractor order")).unwrap();
    let finding = queue.wait_for(&task.id, WAIT).await.unwrap();
    assert_eq!(bad.calls(), 1);
    assert_eq!(finding.sources.len(), 1);
    assert_eq!(finding.sources[0].adapter, "docs");
}

#[tokio::test]
async fn wait_gives_up_before_a_slow_task() {
    let adapter = Arc::new(
        StubAdapter::new("docs", "https://docs.rs/a").slow(Duration::from_millis(500)),
    );
    let queue = queue_with(storage(), vec![adapter], TaskConfig::default());
    let task = queue.submit(&request("slow query")).unwrap();

    let err = queue
        .wait_for(&task.id, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::TaskError(TaskError::WaitTimeout { .. })));
}

// ── Restart ──

#[tokio::test]
async fn orphaned_running_tasks_are_failed_at_startup() {
    let storage = storage();
    let mut orphan = ResearchTask::from_request(&request("left running"));
    orphan.status = TaskStatus::Running;
    storage.insert_task(&orphan).unwrap();

    let queue = queue_with(storage, Vec::new(), TaskConfig::default());
    assert_eq!(queue.recover_orphans().unwrap(), 1);

    let stored = queue.get_task(&orphan.id).unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some(ORPHANED_TASK_ERROR));
    assert_eq!(queue.recover_orphans().unwrap(), 0);
}

#[tokio::test]
async fn persisted_queued_tasks_resume() {
    let storage = storage();
    let waiting = ResearchTask::from_request(&request("queued before restart"));
    storage.insert_task(&waiting).unwrap();

    let adapter = Arc::new(StubAdapter::new("docs", "https://docs.rs/a"));
    let queue = queue_with(storage, vec![adapter], TaskConfig::default());
    assert_eq!(queue.resume_queued().unwrap(), 1);
    queue.wait_for(&waiting.id, WAIT).await.unwrap();
}

// ── Page cache ──

#[tokio::test]
async fn same_page_is_fetched_once_across_tasks() {
    let storage = storage();
    let extractor = Arc::new(CountingExtractor::new());
    let first = Arc::new(StubAdapter::new("docs", "https://docs.rs/tokio/time?utm_source=a"));
    let fetcher = CachingFetcher::new(storage.clone(), extractor.clone());
    let executor = ResearchExecutor::new(storage.clone(), vec![first], Synthesizer::extractive())
        .with_fetcher(fetcher);
    let queue = TaskQueue::new(storage, Arc::new(executor), TaskConfig::default());

    for q in ["tokio interval drift", "tokio missed ticks"] {
        let task = queue.submit(&request(q)).unwrap();
        let finding = queue.wait_for(&task.id, WAIT).await.unwrap();
        assert!(finding.full_content.contains("missed tick behavior"));
    }
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

// ── Soft target ──

fn executor_with(adapter: StubAdapter, extractor: Arc<CountingExtractor>) -> ResearchExecutor {
    let storage = storage();
    let fetcher = CachingFetcher::new(storage.clone(), extractor);
    ResearchExecutor::new(storage, vec![Arc::new(adapter)], Synthesizer::extractive())
        .with_fetcher(fetcher)
}

#[tokio::test(start_paused = true)]
async fn slow_search_skips_page_fetches() {
    let extractor = Arc::new(CountingExtractor::new());
    let adapter =
        StubAdapter::new("docs", "https://docs.rs/tokio/time").slow(Duration::from_secs(20));
    let executor = executor_with(adapter, extractor.clone());

    let task = ResearchTask::from_request(&request("tokio interval drift"));
    let finding = executor.execute(&task).await.unwrap();
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(!finding.sources.is_empty());
    assert!(!finding.full_content.contains("missed tick behavior"));
}

#[tokio::test(start_paused = true)]
async fn page_fetches_stop_at_the_soft_target() {
    let extractor = Arc::new(CountingExtractor::slow(Duration::from_secs(60)));
    let adapter = StubAdapter::new("docs", "https://docs.rs/tokio/time");
    let executor = executor_with(adapter, extractor.clone());

    let started = tokio::time::Instant::now();
    let task = ResearchTask::from_request(&request("tokio interval drift"));
    let finding = executor.execute(&task).await.unwrap();

    let target = ResearchDepth::Quick.budget().target;
    assert!(started.elapsed() < target + Duration::from_secs(1));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert!(!finding.full_content.contains("missed tick behavior"));
}
