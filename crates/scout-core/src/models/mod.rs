mod decision;
mod finding;
mod injection;
mod search;
mod session_record;
mod source_quality;
mod stats;
mod task;
mod url_cache;

pub use decision::{ResearchType, TriggerDecision};
pub use finding::{FindingSource, KeyPoint, ResearchFinding};
pub use injection::{DisclosureLevel, InjectionLogEntry, PendingInjection};
pub use search::{ExtractedContent, SearchRequest, SearchResult, VectorMatch};
pub use session_record::SessionRecord;
pub use source_quality::{DepthOutcome, SourceQualityEntry};
pub use stats::TaskStats;
pub use task::{
    DepthBudget, ResearchDepth, ResearchRequest, ResearchTask, TaskStatus, TriggerSource,
};
pub use url_cache::UrlCacheEntry;
