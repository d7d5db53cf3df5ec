//! # scout-learning
//!
//! Closes the loop: scores how well each delivered injection worked, keeps
//! the per-(domain, topic) source reliability ledger current, and recommends
//! research depth from query shape and from past outcomes.

pub mod depth;
pub mod engine;
pub mod implicit;
pub mod signals;
pub mod source_quality;

pub use depth::{recommend_by_rules, DepthRecommendation};
pub use engine::{MetaLearner, OutcomeRecord};
pub use implicit::{infer_outcome, InferredOutcome};
pub use signals::ExplicitSignals;
