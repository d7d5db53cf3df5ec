//! # scout-dedup
//!
//! Decides whether a candidate research query repeats work already done or
//! in progress.
//!
//! Checks run cheapest first: in-flight claims, the session's own recent
//! research, then the findings history (vector index when ready, lexical
//! otherwise). The window fingerprint check is separate and gates analysis
//! itself rather than a query.

pub mod engine;
pub mod fingerprint;
pub mod inflight;
pub mod lexical;
pub mod semantic;

pub use engine::{DedupEngine, DedupVerdict};
pub use fingerprint::{window_fingerprint, WindowFingerprints};
pub use inflight::InflightGuard;
pub use lexical::{jaccard, normalize_query, significant_words};
