//! In-memory store tests: every table through the `IResearchStorage` contract.

use chrono::{Duration, Utc};
use scout_core::models::*;
use scout_core::traits::IResearchStorage;
use scout_storage::StorageEngine;

fn make_finding(id: &str, domain: &str, depth: ResearchDepth) -> ResearchFinding {
    let now = Utc::now();
    ResearchFinding {
        id: id.to_string(),
        task_id: Some(format!("task-{id}")),
        query: format!("query for {id}"),
        summary: "Use tokio::select! with a cancellation branch.".to_string(),
        key_points: vec![
            KeyPoint::new("select! polls branches concurrently", 1),
            KeyPoint::new("biased; fixes the polling order", 2),
        ],
        full_content: "Full write-up.".to_string(),
        sources: vec![FindingSource {
            title: "tokio docs".to_string(),
            url: "https://docs.rs/tokio/latest/tokio/macro.select.html".to_string(),
            domain: "docs.rs".to_string(),
            quality: 0.9,
            adapter: "docs".to_string(),
        }],
        domain: Some(domain.to_string()),
        depth,
        confidence: 0.82,
        created_at: now,
        last_accessed: now,
        project_path: Some("/work/app".to_string()),
    }
}

// ── Tasks ──

#[test]
fn task_insert_get_update() {
    let store = StorageEngine::open_in_memory().unwrap();
    let req = ResearchRequest::new("axum state", ResearchDepth::Quick, TriggerSource::ToolError)
        .with_session("s1")
        .with_priority(7);
    let mut task = ResearchTask::from_request(&req);
    store.insert_task(&task).unwrap();

    let loaded = store.get_task(&task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Queued);
    assert_eq!(loaded.trigger, TriggerSource::ToolError);
    assert_eq!(loaded.priority, 7);

    task.status = TaskStatus::Running;
    task.attempts = 1;
    task.started_at = Some(Utc::now());
    store.update_task(&task).unwrap();

    let loaded = store.get_task(&task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Running);
    assert_eq!(loaded.attempts, 1);
    assert!(loaded.started_at.is_some());
}

#[test]
fn update_missing_task_is_not_found() {
    let store = StorageEngine::open_in_memory().unwrap();
    let task = ResearchTask::from_request(&ResearchRequest::new(
        "q",
        ResearchDepth::Quick,
        TriggerSource::Manual,
    ));
    let err = store.update_task(&task).unwrap_err();
    assert!(matches!(err, scout_core::ScoutError::TaskNotFound { .. }));
}

#[test]
fn list_tasks_filters_by_status_and_stats_count() {
    let store = StorageEngine::open_in_memory().unwrap();
    for i in 0..3 {
        let mut task = ResearchTask::from_request(&ResearchRequest::new(
            format!("q{i}"),
            ResearchDepth::Medium,
            TriggerSource::Manual,
        ));
        if i == 0 {
            task.status = TaskStatus::Failed;
        }
        store.insert_task(&task).unwrap();
    }
    assert_eq!(store.list_tasks(None, 10).unwrap().len(), 3);
    assert_eq!(store.list_tasks(Some(TaskStatus::Queued), 10).unwrap().len(), 2);
    assert_eq!(store.list_tasks(None, 1).unwrap().len(), 1);

    let stats = store.task_stats().unwrap();
    assert_eq!(stats.queued, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total(), 3);
}

#[test]
fn running_tasks_are_failed_on_recovery() {
    let store = StorageEngine::open_in_memory().unwrap();
    let mut task = ResearchTask::from_request(&ResearchRequest::new(
        "q",
        ResearchDepth::Deep,
        TriggerSource::Strategic,
    ));
    task.status = TaskStatus::Running;
    store.insert_task(&task).unwrap();

    let recovered = store.recover_running_tasks("interrupted").unwrap();
    assert_eq!(recovered, 1);
    let loaded = store.get_task(&task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Failed);
    assert_eq!(loaded.error.as_deref(), Some("interrupted"));
    assert_eq!(store.recover_running_tasks("interrupted").unwrap(), 0);
}

// ── Findings ──

#[test]
fn finding_round_trips_every_field() {
    let store = StorageEngine::open_in_memory().unwrap();
    let finding = make_finding("f1", "rust", ResearchDepth::Medium);
    store.upsert_finding(&finding).unwrap();

    let loaded = store.get_finding("f1").unwrap().unwrap();
    assert_eq!(loaded.summary, finding.summary);
    assert_eq!(loaded.key_points, finding.key_points);
    assert_eq!(loaded.sources, finding.sources);
    assert_eq!(loaded.task_id, finding.task_id);
    assert_eq!(loaded.depth, ResearchDepth::Medium);
    assert_eq!(loaded.confidence, 0.82);
    assert_eq!(loaded.project_path, finding.project_path);
    assert_eq!(
        loaded.created_at.timestamp_micros(),
        finding.created_at.timestamp_micros()
    );
}

#[test]
fn recent_findings_respects_since() {
    let store = StorageEngine::open_in_memory().unwrap();
    let mut old = make_finding("old", "rust", ResearchDepth::Quick);
    old.created_at = Utc::now() - Duration::days(3);
    store.upsert_finding(&old).unwrap();
    store
        .upsert_finding(&make_finding("new", "rust", ResearchDepth::Quick))
        .unwrap();

    let recent = store
        .recent_findings(Utc::now() - Duration::days(1), 10)
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "new");
    assert_eq!(store.list_findings(10).unwrap().len(), 2);
}

#[test]
fn touch_updates_last_accessed() {
    let store = StorageEngine::open_in_memory().unwrap();
    let mut finding = make_finding("f1", "rust", ResearchDepth::Quick);
    finding.last_accessed = Utc::now() - Duration::hours(5);
    store.upsert_finding(&finding).unwrap();
    store.touch_finding("f1").unwrap();
    let loaded = store.get_finding("f1").unwrap().unwrap();
    assert!(loaded.last_accessed > finding.last_accessed);
}

// ── Sessions ──

#[test]
fn ended_session_stays_ended() {
    let store = StorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let mut record = SessionRecord {
        id: "s1".to_string(),
        project_path: Some("/work".to_string()),
        started_at: now,
        last_activity: now,
        ended_at: Some(now),
        active: false,
        snapshot: serde_json::json!({"topics": ["rust"]}),
    };
    store.save_session(&record).unwrap();

    record.ended_at = None;
    record.active = true;
    store.save_session(&record).unwrap();

    let loaded = store.get_session("s1").unwrap().unwrap();
    assert!(!loaded.active);
    assert!(loaded.ended_at.is_some());
    assert_eq!(loaded.snapshot["topics"][0], "rust");
}

#[test]
fn later_incarnation_replaces_ended_row() {
    let store = StorageEngine::open_in_memory().unwrap();
    let first = Utc::now();
    let ended = SessionRecord {
        id: "s1".to_string(),
        project_path: None,
        started_at: first,
        last_activity: first,
        ended_at: Some(first),
        active: false,
        snapshot: serde_json::json!({}),
    };
    store.save_session(&ended).unwrap();

    let restarted = SessionRecord {
        started_at: first + Duration::seconds(5),
        last_activity: first + Duration::seconds(5),
        ended_at: None,
        active: true,
        ..ended
    };
    store.save_session(&restarted).unwrap();

    let loaded = store.get_session("s1").unwrap().unwrap();
    assert!(loaded.active);
    assert!(loaded.ended_at.is_none());
    assert_eq!((loaded.started_at - restarted.started_at).num_milliseconds(), 0);
}

// ── Injection log ──

#[test]
fn injection_effectiveness_and_depth_outcomes() {
    let store = StorageEngine::open_in_memory().unwrap();
    store
        .upsert_finding(&make_finding("f1", "react", ResearchDepth::Quick))
        .unwrap();
    store
        .upsert_finding(&make_finding("f2", "react", ResearchDepth::Deep))
        .unwrap();

    let a = InjectionLogEntry::new("f1", "s1", DisclosureLevel::Summary, "tool_error", 120);
    let b = InjectionLogEntry::new("f2", "s1", DisclosureLevel::KeyPoints, "stuck", 300);
    store.insert_injection(&a).unwrap();
    store.insert_injection(&b).unwrap();
    store.record_effectiveness(&a.id, 0.8, true).unwrap();
    store.record_effectiveness(&b.id, -0.4, false).unwrap();
    store.mark_followup_injected(&b.id).unwrap();

    let loaded = store.get_injection(&b.id).unwrap().unwrap();
    assert!(loaded.followup_injected);
    assert_eq!(loaded.disclosure_level, DisclosureLevel::KeyPoints);
    assert_eq!(loaded.effectiveness, Some(-0.4));

    let outcomes = store.depth_outcomes("react").unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes
        .iter()
        .any(|o| o.depth == ResearchDepth::Quick && o.helpful));
    assert!(outcomes
        .iter()
        .any(|o| o.depth == ResearchDepth::Deep && !o.helpful));
    assert_eq!(store.injections_for_session("s1").unwrap().len(), 2);
}

#[test]
fn effectiveness_for_unknown_injection_is_not_found() {
    let store = StorageEngine::open_in_memory().unwrap();
    let err = store.record_effectiveness("nope", 0.5, false).unwrap_err();
    assert!(matches!(err, scout_core::ScoutError::InjectionNotFound { .. }));
}

// ── Source quality ──

#[test]
fn reliability_is_half_then_two_thirds() {
    let store = StorageEngine::open_in_memory().unwrap();
    let first = store.record_citation("docs.rs", "rust", 1.0).unwrap();
    assert_eq!(first.citation_count, 1);
    assert!((first.reliability - 0.5).abs() < 1e-9);

    let second = store.record_citation("docs.rs", "rust", 1.0).unwrap();
    assert_eq!(second.citation_count, 2);
    assert!((second.reliability - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn unhelpful_citation_lowers_reliability() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.record_citation("medium.com", "react", 1.0).unwrap();
    let entry = store.record_citation("medium.com", "react", 0.0).unwrap();
    assert!((entry.reliability - 1.0 / 3.0).abs() < 1e-9);

    store.record_citation("react.dev", "react", 1.0).unwrap();
    store.record_citation("react.dev", "react", 1.0).unwrap();
    let top = store.top_sources("react", 5).unwrap();
    assert_eq!(top[0].domain, "react.dev");
}

// ── URL cache ──

#[test]
fn cache_get_increments_hits_and_evicts_expired() {
    let store = StorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let entry = UrlCacheEntry {
        normalized_url: "https://docs.rs/tokio".to_string(),
        raw_url: "https://docs.rs/tokio/".to_string(),
        title: Some("tokio".to_string()),
        content: "runtime".to_string(),
        content_length: 7,
        scraped_at: now,
        expires_at: now + Duration::days(7),
        hit_count: 0,
    };
    store.cache_put(&entry).unwrap();

    assert_eq!(store.cache_get(&entry.normalized_url, now).unwrap().unwrap().hit_count, 1);
    assert_eq!(store.cache_get(&entry.normalized_url, now).unwrap().unwrap().hit_count, 2);

    let later = now + Duration::days(8);
    assert!(store.cache_get(&entry.normalized_url, later).unwrap().is_none());
    // Evicted, so even the original clock misses now.
    assert!(store.cache_get(&entry.normalized_url, now).unwrap().is_none());
}

#[test]
fn purge_removes_only_expired() {
    let store = StorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    for (url, ttl) in [("https://a.com", 1), ("https://b.com", 48)] {
        store
            .cache_put(&UrlCacheEntry {
                normalized_url: url.to_string(),
                raw_url: url.to_string(),
                title: None,
                content: String::new(),
                content_length: 0,
                scraped_at: now,
                expires_at: now + Duration::hours(ttl),
                hit_count: 0,
            })
            .unwrap();
    }
    let purged = store.cache_purge_expired(now + Duration::hours(2)).unwrap();
    assert_eq!(purged, 1);
}
