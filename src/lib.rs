//! gadget-search library
//!
//! Find gadgets by describing what they do.
//!
//! # Modules
//!
//! - `core`: Catalog table, storage paths and engine configuration
//! - `search`: Embedding, vector index and the search engine

pub mod core;
pub mod search;

// Re-exports for convenience
pub use crate::core::catalog::{Catalog, CatalogItem};
pub use crate::core::config::{EngineConfig, PoolStrategy};
pub use crate::core::paths::StoragePaths;
pub use search::{
    normalize_l2, Embedder, EmbeddingModel, EngineStats, LoadError, SearchEngine, SearchError,
    SearchResult, VectorIndex,
};
