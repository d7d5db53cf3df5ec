/// Failures talking to the LLM oracle. Never surfaced to the host; callers
/// degrade to a deterministic decision instead.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("oracle timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("oracle request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("malformed oracle response: {reason}")]
    MalformedResponse { reason: String },
}
