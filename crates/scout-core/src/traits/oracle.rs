use async_trait::async_trait;

use crate::errors::OracleError;

/// Opaque LLM: prompt in, free text out.
#[async_trait]
pub trait IOracle: Send + Sync {
    /// Complete a prompt. Callers degrade locally on error.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;

    /// Human-readable oracle name.
    fn name(&self) -> &str;
}
