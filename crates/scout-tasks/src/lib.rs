//! # scout-tasks
//!
//! Research task queue and execution.
//!
//! - `queue`: `TaskQueue`: global concurrency cap, priority-then-FIFO
//!   scheduling, depth hard timeouts, bounded retry, orphan recovery and a
//!   broadcast channel of lifecycle events
//! - `executor`: concurrent fan-out to every search adapter, merge by
//!   normalized URL, ranking, cache-through page fetches
//! - `synthesis`: oracle synthesis of a finding with an extractive fallback
//! - `extractive`: sentence splitting and TextRank for the fallback

pub mod events;
pub mod executor;
pub mod extractive;
pub mod queue;
pub mod ranking;
pub mod synthesis;

pub use events::TaskEvent;
pub use executor::ResearchExecutor;
pub use queue::{QueueStats, TaskQueue};
pub use synthesis::Synthesizer;
