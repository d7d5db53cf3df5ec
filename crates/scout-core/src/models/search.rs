use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query sent to every specialist adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

/// One hit from a search adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Adapter name.
    pub source: String,
    /// Adapter-reported relevance in [0, 1], if any.
    pub relevance: Option<f64>,
}

/// Page text returned by a content extractor or the URL cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    /// True when served from the URL cache.
    pub from_cache: bool,
}

/// Nearest-neighbour hit from the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub finding_id: String,
    pub query: String,
    /// Cosine similarity in [0, 1].
    pub score: f64,
    pub created_at: DateTime<Utc>,
}
