use chrono::Utc;
use scout_core::models::*;

#[test]
fn task_status_round_trips_through_str() {
    for status in [
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Injected,
    ] {
        assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(TaskStatus::parse("paused"), None);
}

#[test]
fn task_from_request_starts_queued() {
    let req = ResearchRequest::new("axum extractors", ResearchDepth::Medium, TriggerSource::Manual)
        .with_session("s1")
        .with_priority(8);
    let task = ResearchTask::from_request(&req);
    assert_eq!(task.status, TaskStatus::Queued);
    assert_eq!(task.attempts, 0);
    assert_eq!(task.priority, 8);
    assert_eq!(task.session_id.as_deref(), Some("s1"));
    assert!(task.started_at.is_none());
}

#[test]
fn disclosure_level_saturates_at_full() {
    assert_eq!(DisclosureLevel::Summary.next(), DisclosureLevel::KeyPoints);
    assert_eq!(DisclosureLevel::KeyPoints.next(), DisclosureLevel::Full);
    assert_eq!(DisclosureLevel::Full.next(), DisclosureLevel::Full);
    assert_eq!(DisclosureLevel::from_u8(2).as_u8(), 2);
    assert_eq!(DisclosureLevel::from_u8(9), DisclosureLevel::Full);
}

#[test]
fn no_research_decision_is_not_actionable() {
    let d = TriggerDecision::no_research("user prompt");
    assert!(!d.should_research);
    assert!(!d.is_actionable());
}

#[test]
fn finding_source_domains_are_distinct_and_ordered() {
    let now = Utc::now();
    let src = |domain: &str| FindingSource {
        title: "t".into(),
        url: format!("https://{domain}/x"),
        domain: domain.into(),
        quality: 0.5,
        adapter: "web".into(),
    };
    let finding = ResearchFinding {
        id: "f1".into(),
        task_id: None,
        query: "q".into(),
        summary: "s".into(),
        key_points: vec![],
        full_content: String::new(),
        sources: vec![src("docs.rs"), src("github.com"), src("docs.rs")],
        domain: Some("rust".into()),
        depth: ResearchDepth::Quick,
        confidence: 0.8,
        created_at: now,
        last_accessed: now,
        project_path: None,
    };
    assert_eq!(finding.source_domains(), vec!["docs.rs", "github.com"]);
}

#[test]
fn url_cache_entry_expiry_is_inclusive() {
    let now = Utc::now();
    let entry = UrlCacheEntry {
        normalized_url: "https://docs.rs/tokio".into(),
        raw_url: "https://docs.rs/tokio/".into(),
        title: None,
        content: "body".into(),
        content_length: 4,
        scraped_at: now,
        expires_at: now,
        hit_count: 0,
    };
    assert!(entry.is_expired(now));
    assert!(!entry.is_expired(now - chrono::Duration::seconds(1)));
}
