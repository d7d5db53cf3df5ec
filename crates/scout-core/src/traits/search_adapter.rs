use async_trait::async_trait;

use crate::errors::ScoutResult;
use crate::models::{SearchRequest, SearchResult};

/// A specialist knowledge source (docs, Q&A, code hosting, web).
#[async_trait]
pub trait ISearchAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> ScoutResult<Vec<SearchResult>>;
}
