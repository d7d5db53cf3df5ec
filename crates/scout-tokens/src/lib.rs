//! # scout-tokens
//!
//! Exact token counting via `tiktoken-rs` (`cl100k_base`) for the injection
//! budgets. Counts are cached per blake3 content hash.

pub mod budget;
pub mod counter;

pub use budget::TokenBudget;
pub use counter::TokenCounter;
