//! # scout-trigger
//!
//! Decides when external research would help a live session.
//!
//! Three paths, cheapest first:
//! - `quick`: ordered error-pattern table over the latest tool output
//! - `proactive`: stuck focus or due strategic analysis
//! - `engine::TriggerEngine::analyze`: one oracle call over a structured
//!   digest, cooldown and fingerprint gated, with a keyword fallback
//!
//! User-originated events never trigger research.

pub mod cooldown;
pub mod digest;
pub mod engine;
pub mod parse;
pub mod proactive;
pub mod quick;
pub mod rules;

pub use cooldown::Cooldown;
pub use engine::TriggerEngine;
pub use quick::quick_analyze;
