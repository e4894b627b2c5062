//! Semantic gadget search
//!
//! Query embedding, exact vector index, and the engine that joins index
//! rows to the catalog and collapses duplicate gadget names.

pub mod embedding;
pub mod engine;
pub mod error;
pub mod vectordb;

pub use embedding::{normalize_l2, Embedder, EmbeddingModel};
pub use engine::{unique_top_k, EngineStats, SearchEngine, SearchResult};
pub use error::{LoadError, SearchError};
pub use vectordb::{Hit, VectorIndex, NO_ROW};
