//! # scout-injection
//!
//! Decides which completed findings reach a session, and in what shape.
//!
//! - `budget`: per-session count, token and cooldown ledger
//! - `scorer`: static multi-factor candidate score
//! - `relevance`: oracle task-relevance gate with a configurable fallback
//! - `format`: delimited blocks rendered at a disclosure level
//! - `disclosure`: when a session earns the next disclosure level
//! - `manager`: `InjectionManager`: admission, delivery and detail lookups

pub mod budget;
pub mod disclosure;
pub mod format;
pub mod manager;
pub mod relevance;
pub mod scorer;

pub use budget::{BudgetBlock, BudgetLedger, BudgetUsage};
pub use format::{render_block, render_detail};
pub use manager::{Admission, AdmitOptions, Delivery, InjectionManager, Rejection};
pub use relevance::{GateOutcome, RelevanceGate};
pub use scorer::{score_candidate, CandidateScore};
