use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable page cache row, unique on `normalized_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlCacheEntry {
    pub normalized_url: String,
    pub raw_url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_length: usize,
    pub scraped_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
}

impl UrlCacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
