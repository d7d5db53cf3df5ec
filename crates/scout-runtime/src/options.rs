use std::path::PathBuf;
use std::sync::Arc;

use scout_core::traits::{IContentExtractor, IOracle, ISearchAdapter, IVectorIndex};

/// Options for building a runtime.
#[derive(Default)]
pub struct RuntimeOptions {
    /// Path to the SQLite database. Falls back to `storage.db_path` from the
    /// configuration, then to in-memory.
    pub db_path: Option<PathBuf>,
    /// TOML configuration string. If None, uses defaults.
    pub config_toml: Option<String>,
    pub oracle: Option<Arc<dyn IOracle>>,
    pub adapters: Vec<Arc<dyn ISearchAdapter>>,
    /// Page fetcher behind the URL cache. Without one, research works from
    /// adapter snippets only.
    pub extractor: Option<Arc<dyn IContentExtractor>>,
    pub vector_index: Option<Arc<dyn IVectorIndex>>,
    /// Install the global tracing subscriber from `[observability]`.
    pub init_tracing: bool,
}

impl RuntimeOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_config_toml(mut self, toml: impl Into<String>) -> Self {
        self.config_toml = Some(toml.into());
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn IOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ISearchAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn IContentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_tracing(mut self) -> Self {
        self.init_tracing = true;
        self
    }

    pub fn with_vector_index(mut self, index: Arc<dyn IVectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }
}
