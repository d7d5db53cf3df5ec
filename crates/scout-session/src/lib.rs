//! # scout-session
//!
//! One mutable context per live coding session, held in a `DashMap`.
//!
//! ## Modules
//!
//! - `conversation`: bounded window of user prompts and tool uses
//! - `context`: `SessionContext` and its bounded histories
//! - `extraction`: declarative rule tables for topics, tech stack, tasks,
//!   error signatures and file references
//! - `focus`: focus tracking and stuck detection
//! - `strategic`: strategic timing and complementary suggestions
//! - `manager`: `SessionManager`, the single writer of every context
//! - `cleanup`: inactivity sweep
//! - `analytics`: per-session counters

pub mod analytics;
pub mod cleanup;
pub mod context;
pub mod conversation;
pub mod extraction;
pub mod focus;
pub mod manager;
pub mod strategic;

pub use analytics::SessionAnalytics;
pub use cleanup::sweep_inactive;
pub use context::{ResearchRecord, SessionContext};
pub use conversation::{ConversationEntry, EntryKind, ToolUseEvent, UserPromptEvent};
pub use extraction::{ErrorKind, ErrorSignature};
pub use focus::{FocusRecord, FocusTracker, StuckIndicator};
pub use manager::{SessionEnd, SessionManager};
