mod content_extractor;
mod oracle;
mod search_adapter;
mod storage;
mod vector_index;

pub use content_extractor::IContentExtractor;
pub use oracle::IOracle;
pub use search_adapter::ISearchAdapter;
pub use storage::IResearchStorage;
pub use vector_index::IVectorIndex;
