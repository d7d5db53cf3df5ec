/// Scout system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Delimiters wrapping every block injected into a host session.
pub const INJECTION_BLOCK_START: &str = "<scout-research>";
pub const INJECTION_BLOCK_END: &str = "</scout-research>";

/// Lowest and highest task / injection priority.
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// Error string written to tasks found `running` at startup.
pub const ORPHANED_TASK_ERROR: &str = "interrupted: process restarted while task was running";

/// Source-quality topic for findings with no detected domain.
pub const GENERAL_TOPIC: &str = "general";

/// Feature flags.
pub const FEATURE_SEMANTIC_DEDUP: bool = true;
pub const FEATURE_META_LEARNING: bool = true;
