use std::sync::Arc;

use chrono::{DateTime, Utc};

use scout_core::errors::ScoutResult;
use scout_core::models::{ExtractedContent, UrlCacheEntry};
use scout_core::traits::{IContentExtractor, IResearchStorage};

use super::url::{domain_of, normalize_url, ttl_for_domain};

/// Page fetcher that consults the durable URL cache before the extractor.
/// Within a page's TTL, one extractor call serves every read of its normalized URL.
#[derive(Clone)]
pub struct CachingFetcher {
    storage: Arc<dyn IResearchStorage>,
    extractor: Arc<dyn IContentExtractor>,
}

impl CachingFetcher {
    pub fn new(storage: Arc<dyn IResearchStorage>, extractor: Arc<dyn IContentExtractor>) -> Self {
        Self { storage, extractor }
    }

    pub async fn fetch(&self, url: &str) -> ScoutResult<ExtractedContent> {
        self.fetch_at(url, Utc::now()).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit clock.
    pub async fn fetch_at(&self, url: &str, now: DateTime<Utc>) -> ScoutResult<ExtractedContent> {
        let key = normalize_url(url);

        match self.storage.cache_get(&key, now) {
            Ok(Some(hit)) => {
                tracing::debug!(url = %key, hits = hit.hit_count, "url cache hit");
                return Ok(ExtractedContent {
                    url: hit.raw_url,
                    title: hit.title,
                    content: hit.content,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %key, error = %e, "url cache read failed"),
        }

        let page = self.extractor.extract(url).await?;
        let ttl = ttl_for_domain(domain_of(url).as_deref().unwrap_or_default());
        let entry = UrlCacheEntry {
            normalized_url: key.clone(),
            raw_url: url.to_string(),
            title: page.title.clone(),
            content_length: page.content.len(),
            content: page.content.clone(),
            scraped_at: now,
            expires_at: now + ttl,
            hit_count: 0,
        };
        if let Err(e) = self.storage.cache_put(&entry) {
            tracing::warn!(url = %key, error = %e, "url cache write failed");
        }

        Ok(ExtractedContent {
            from_cache: false,
            ..page
        })
    }
}
