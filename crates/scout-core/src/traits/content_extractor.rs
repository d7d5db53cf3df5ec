use async_trait::async_trait;

use crate::errors::ScoutResult;
use crate::models::ExtractedContent;

/// Fetches page text for a URL. Only consulted after a URL cache miss.
#[async_trait]
pub trait IContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> ScoutResult<ExtractedContent>;
}
