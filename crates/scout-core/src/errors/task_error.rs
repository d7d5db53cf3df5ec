/// Research task execution errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {task_id} timed out after {after_secs}s")]
    Timeout { task_id: String, after_secs: u64 },

    #[error("no results from any source for query: {query}")]
    EmptyResultPool { query: String },

    #[error("task {task_id} failed: {error}")]
    Failed { task_id: String, error: String },

    #[error("task queue is closed")]
    QueueClosed,

    #[error("waiting for task {task_id} timed out after {after_secs}s")]
    WaitTimeout { task_id: String, after_secs: u64 },
}
