mod oracle_error;
mod storage_error;
mod task_error;

pub use oracle_error::OracleError;
pub use storage_error::StorageError;
pub use task_error::TaskError;

/// Top-level error type for every Scout subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    #[error("finding not found: {id}")]
    FindingNotFound { id: String },

    #[error("injection not found: {id}")]
    InjectionNotFound { id: String },

    #[error("invalid status transition for task {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("token budget exceeded: needed {needed} tokens, available {available}")]
    TokenBudgetExceeded { needed: usize, available: usize },

    #[error("adapter {adapter} failed: {reason}")]
    AdapterError { adapter: String, reason: String },

    #[error("degraded mode: {component} using fallback {fallback}")]
    DegradedMode { component: String, fallback: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error("task error: {0}")]
    TaskError(#[from] TaskError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Convenience alias used across the workspace.
pub type ScoutResult<T> = Result<T, ScoutError>;
