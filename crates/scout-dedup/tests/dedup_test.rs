use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use proptest::prelude::*;

use scout_core::config::DedupConfig;
use scout_core::errors::{ScoutError, ScoutResult};
use scout_core::models::{ResearchDepth, ResearchFinding, VectorMatch};
use scout_core::traits::{IResearchStorage, IVectorIndex};
use scout_dedup::lexical::text_similarity;
use scout_dedup::{jaccard, significant_words, DedupEngine, DedupVerdict};
use scout_session::{ResearchRecord, SessionContext};
use scout_storage::StorageEngine;

fn finding(id: &str, query: &str, age: Duration) -> ResearchFinding {
    let at = Utc::now() - age;
    ResearchFinding {
        id: id.to_string(),
        task_id: None,
        query: query.to_string(),
        summary: "summary".to_string(),
        key_points: vec![],
        full_content: String::new(),
        sources: vec![],
        domain: Some("react".to_string()),
        depth: ResearchDepth::Medium,
        confidence: 0.7,
        created_at: at,
        last_accessed: at,
        project_path: None,
    }
}

fn session_with(query: &str, age: Duration) -> SessionContext {
    let mut ctx = SessionContext::new("s1", None, Utc::now());
    ctx.research_history.push_back(ResearchRecord {
        query: query.to_string(),
        task_id: Some("t1".to_string()),
        at: Utc::now() - age,
        injected: false,
        confidence: 0.7,
    });
    ctx
}

fn store() -> Arc<dyn IResearchStorage> {
    Arc::new(StorageEngine::open_in_memory().unwrap())
}

struct StubIndex {
    ready: bool,
    fail: bool,
    matches: Vec<VectorMatch>,
}

#[async_trait]
impl IVectorIndex for StubIndex {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn nearest(&self, _query: &str, _limit: usize) -> ScoutResult<Vec<VectorMatch>> {
        if self.fail {
            return Err(ScoutError::ValidationError("index offline".into()));
        }
        Ok(self.matches.clone())
    }
}

// ── Session window ──

#[tokio::test]
async fn duplicate_inside_session_window_and_not_after() {
    let engine = DedupEngine::new(store(), DedupConfig::default());
    let query = "react useEffect infinite render loop";

    let recent = session_with("useEffect infinite render loop react", Duration::minutes(5));
    let verdict = engine.check(query, Some(&recent), Utc::now()).await.unwrap();
    assert!(matches!(verdict, DedupVerdict::RecentSessionResearch { .. }));

    let stale = session_with("useEffect infinite render loop react", Duration::minutes(45));
    let verdict = engine.check(query, Some(&stale), Utc::now()).await.unwrap();
    assert_eq!(verdict, DedupVerdict::Unique);
}

#[tokio::test]
async fn in_flight_query_is_suppressed() {
    let engine = DedupEngine::new(store(), DedupConfig::default());
    let ctx = SessionContext::new("s1", None, Utc::now());
    assert!(engine
        .inflight()
        .try_claim("s1", "axum middleware ordering", 0.4));

    let verdict = engine
        .check("axum middleware ordering layers", Some(&ctx), Utc::now())
        .await
        .unwrap();
    assert!(matches!(verdict, DedupVerdict::InFlight { .. }));
}

// ── History ──

#[tokio::test]
async fn recent_finding_with_similar_query_is_known() {
    let storage = store();
    storage
        .upsert_finding(&finding("f1", "prisma migration drift error", Duration::hours(2)))
        .unwrap();
    let engine = DedupEngine::new(storage, DedupConfig::default());

    let verdict = engine
        .check("prisma migration drift", None, Utc::now())
        .await
        .unwrap();
    assert_eq!(verdict.finding_id(), Some("f1"));

    let verdict = engine
        .check("tailwind dark mode", None, Utc::now())
        .await
        .unwrap();
    assert!(!verdict.is_duplicate());
}

#[tokio::test]
async fn finding_outside_history_window_is_ignored() {
    let storage = store();
    storage
        .upsert_finding(&finding("old", "prisma migration drift error", Duration::hours(30)))
        .unwrap();
    let engine = DedupEngine::new(storage, DedupConfig::default());
    let verdict = engine
        .check("prisma migration drift error", None, Utc::now())
        .await
        .unwrap();
    assert_eq!(verdict, DedupVerdict::Unique);
}

// ── Semantic ──

#[tokio::test]
async fn ready_index_replaces_lexical_history() {
    let storage = store();
    storage
        .upsert_finding(&finding("f1", "prisma migration drift error", Duration::hours(1)))
        .unwrap();
    let index = StubIndex {
        ready: true,
        fail: false,
        matches: vec![
            VectorMatch {
                finding_id: "f9".into(),
                query: "orm schema drift".into(),
                score: 0.91,
                created_at: Utc::now() - Duration::hours(1),
            },
            VectorMatch {
                finding_id: "f8".into(),
                query: "old".into(),
                score: 0.95,
                created_at: Utc::now() - Duration::days(3),
            },
        ],
    };
    let engine =
        DedupEngine::new(storage, DedupConfig::default()).with_vector_index(Arc::new(index));

    let verdict = engine
        .check("prisma migration drift", None, Utc::now())
        .await
        .unwrap();
    assert_eq!(verdict.finding_id(), Some("f9"));
}

#[tokio::test]
async fn failing_or_unready_index_falls_back_to_lexical() {
    for (ready, fail) in [(true, true), (false, false)] {
        let storage = store();
        storage
            .upsert_finding(&finding("f1", "prisma migration drift error", Duration::hours(1)))
            .unwrap();
        let index = StubIndex {
            ready,
            fail,
            matches: vec![],
        };
        let engine =
            DedupEngine::new(storage, DedupConfig::default()).with_vector_index(Arc::new(index));
        let verdict = engine
            .check("prisma migration drift", None, Utc::now())
            .await
            .unwrap();
        assert_eq!(verdict.finding_id(), Some("f1"));
    }
}

// ── Properties ──

proptest! {
    #[test]
    fn jaccard_is_bounded_and_symmetric(a in "[a-z ]{0,60}", b in "[a-z ]{0,60}") {
        let (wa, wb) = (significant_words(&a), significant_words(&b));
        let ab = jaccard(&wa, &wb);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - jaccard(&wb, &wa)).abs() < 1e-12);
    }

    #[test]
    fn text_is_fully_similar_to_itself(words in prop::collection::vec("[a-z]{4,8}", 1..8)) {
        let text = words.join(" ");
        prop_assert!((text_similarity(&text, &text) - 1.0).abs() < 1e-12);
    }
}
