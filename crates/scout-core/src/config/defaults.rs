// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "scout.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Session ---
pub const DEFAULT_WINDOW_SIZE: usize = 100;
pub const DEFAULT_TOOL_OUTPUT_MAX_CHARS: usize = 2_000;
pub const DEFAULT_ERROR_HISTORY: usize = 20;
pub const DEFAULT_FOCUS_HISTORY: usize = 20;
pub const DEFAULT_TASK_HISTORY: usize = 10;
pub const DEFAULT_RESEARCH_HISTORY: usize = 50;
pub const DEFAULT_MAX_TOUCHED_PATHS: usize = 200;
pub const DEFAULT_STUCK_THRESHOLD: u32 = 8;
pub const DEFAULT_STRATEGIC_TOOL_USE_THRESHOLD: u32 = 15;
pub const DEFAULT_STRATEGIC_MIN_INTERVAL_SECS: u64 = 120; // 2 minutes
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

// --- Trigger ---
pub const DEFAULT_TRIGGER_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_DIGEST_ENTRIES: usize = 8;
pub const DEFAULT_DEDUP_WINDOW_ENTRIES: usize = 5;
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_DIRECT_CONFIDENCE_FLOOR: f64 = 0.4;
pub const DEFAULT_ALTERNATIVE_CONFIDENCE_FLOOR: f64 = 0.6;
pub const DEFAULT_VALIDATION_CONFIDENCE_FLOOR: f64 = 0.5;

// --- Dedup ---
pub const DEFAULT_HISTORY_SIMILARITY: f64 = 0.5;
pub const DEFAULT_SESSION_SIMILARITY: f64 = 0.6;
pub const DEFAULT_INFLIGHT_SIMILARITY: f64 = 0.4;
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.8;
pub const DEFAULT_SESSION_DEDUP_WINDOW_SECS: u64 = 1_800; // 30 minutes
pub const DEFAULT_HISTORY_WINDOW_SECS: u64 = 86_400; // 24 hours
pub const DEFAULT_SEMANTIC_WINDOW_SECS: u64 = 86_400; // 24 hours
pub const DEFAULT_HISTORY_SCAN_LIMIT: usize = 100;

// --- Tasks ---
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 2;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

// --- Injection ---
pub const DEFAULT_MAX_INJECTIONS_PER_SESSION: u32 = 10;
pub const DEFAULT_MAX_TOKENS_PER_INJECTION: usize = 600;
pub const DEFAULT_MAX_TOTAL_TOKENS_PER_SESSION: usize = 4_000;
pub const DEFAULT_INJECTION_COOLDOWN_MS: u64 = 60_000; // 1 minute
pub const DEFAULT_MIN_CANDIDATE_SCORE: f64 = 0.5;
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.75;
pub const DEFAULT_MAX_CITATIONS: usize = 3;
pub const DEFAULT_RELEVANCE_TIMEOUT_SECS: u64 = 15;

// --- Learning ---
pub const DEFAULT_MIN_DEPTH_SAMPLES: usize = 5;
pub const DEFAULT_MIN_SAMPLES_PER_DEPTH: usize = 2;
pub const DEFAULT_MIN_DEPTH_SUCCESS_RATE: f64 = 0.6;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_ENV_VAR: &str = "SCOUT_LOG";
pub const DEFAULT_JSON_LOGS: bool = true;
