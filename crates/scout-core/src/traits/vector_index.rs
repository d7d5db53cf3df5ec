use async_trait::async_trait;

use crate::errors::ScoutResult;
use crate::models::VectorMatch;

/// Optional similarity index over past findings.
#[async_trait]
pub trait IVectorIndex: Send + Sync {
    /// Whether the index can answer queries right now.
    fn is_ready(&self) -> bool;

    /// Nearest findings to `query`, best first.
    async fn nearest(&self, query: &str, limit: usize) -> ScoutResult<Vec<VectorMatch>>;
}
