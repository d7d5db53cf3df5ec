//! # scout-runtime
//!
//! Composition root for the research pipeline. `ScoutRuntime` owns exactly one
//! instance of every engine, built by the caller and wired by explicit
//! dependency injection. There is no process-wide singleton.
//!
//! ## Surface
//!
//! - `on_user_prompt` / `on_tool_use`: foreground event ingestion. Updates
//!   the session and delivers at most one pending block. Performs no I/O and
//!   never awaits.
//! - `research` / `research_and_wait`: the deliberate path
//! - `status`, `session_stats`, task and finding listings
//! - `settings` / `update_settings`, `record_feedback`
//! - `start_background` / `shutdown`
//!
//! ## Background
//!
//! Persistence, delivery logging, disclosure refresh and trigger analysis run
//! on one worker fed by an unbounded channel. A second task admits completed
//! findings into their sessions; a third sweeps idle sessions.

mod background;
pub mod options;
pub mod runtime;
pub mod types;

pub use options::RuntimeOptions;
pub use runtime::ScoutRuntime;
pub use types::{EventResponse, ManualResearchRequest, RuntimeStatus, SessionStats};
