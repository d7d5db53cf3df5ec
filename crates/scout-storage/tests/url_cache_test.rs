//! Cache-through fetching: one extractor call per normalized URL within TTL.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use scout_core::errors::ScoutResult;
use scout_core::models::ExtractedContent;
use scout_core::traits::{IContentExtractor, IResearchStorage};
use scout_storage::{normalize_url, CachingFetcher, StorageEngine};

struct CountingExtractor {
    calls: AtomicUsize,
}

#[async_trait]
impl IContentExtractor for CountingExtractor {
    async fn extract(&self, url: &str) -> ScoutResult<ExtractedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExtractedContent {
            url: url.to_string(),
            title: Some("page".to_string()),
            content: format!("content of {url}"),
            from_cache: false,
        })
    }
}

fn setup() -> (Arc<StorageEngine>, Arc<CountingExtractor>, CachingFetcher) {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let extractor = Arc::new(CountingExtractor {
        calls: AtomicUsize::new(0),
    });
    let fetcher = CachingFetcher::new(store.clone(), extractor.clone());
    (store, extractor, fetcher)
}

#[tokio::test]
async fn variants_of_one_url_fetch_once() {
    let (store, extractor, fetcher) = setup();
    let now = Utc::now();

    let first = fetcher
        .fetch_at("https://docs.rs/serde/?utm_source=chat#derive", now)
        .await
        .unwrap();
    assert!(!first.from_cache);

    let second = fetcher.fetch_at("https://DOCS.rs/serde", now).await.unwrap();
    assert!(second.from_cache);
    let third = fetcher.fetch_at("https://docs.rs/serde/", now).await.unwrap();
    assert!(third.from_cache);

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    let entry = store
        .cache_get(&normalize_url("https://docs.rs/serde"), now)
        .unwrap()
        .unwrap();
    // Two fetcher hits plus this read.
    assert_eq!(entry.hit_count, 3);
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let (_store, extractor, fetcher) = setup();
    let now = Utc::now();
    fetcher.fetch_at("https://github.com/tokio-rs/tokio", now).await.unwrap();

    // GitHub pages live one day.
    let later = now + Duration::hours(25);
    let page = fetcher
        .fetch_at("https://github.com/tokio-rs/tokio", later)
        .await
        .unwrap();
    assert!(!page.from_cache);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn docs_pages_stay_fresh_for_days() {
    let (_store, extractor, fetcher) = setup();
    let now = Utc::now();
    fetcher.fetch_at("https://docs.rs/axum", now).await.unwrap();
    let page = fetcher
        .fetch_at("https://docs.rs/axum", now + Duration::days(6))
        .await
        .unwrap();
    assert!(page.from_cache);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}
