//! Vector-index similarity over recent findings.

use chrono::{DateTime, Duration, Utc};

use scout_core::errors::ScoutResult;
use scout_core::models::VectorMatch;
use scout_core::traits::IVectorIndex;

/// Neighbours requested per check.
const NEAREST_LIMIT: usize = 5;

/// Best match at or above `threshold` created within `window` of `now`.
pub async fn nearest_duplicate(
    index: &dyn IVectorIndex,
    query: &str,
    threshold: f64,
    window: Duration,
    now: DateTime<Utc>,
) -> ScoutResult<Option<VectorMatch>> {
    let matches = index.nearest(query, NEAREST_LIMIT).await?;
    Ok(matches
        .into_iter()
        .filter(|m| m.score >= threshold && now - m.created_at <= window)
        .max_by(|a, b| a.score.total_cmp(&b.score)))
}
