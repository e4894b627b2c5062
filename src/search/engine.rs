//! Search Engine - combines embedding model, vector index and catalog
//!
//! The index and catalog are joined by row position: row `i` of the index
//! must describe row `i` of the catalog. Both are produced by the same
//! builder run; the engine checks that their row counts agree but cannot
//! check the ordering itself.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::embedding::{normalize_l2, Embedder, EmbeddingModel};
use super::error::{LoadError, Result, SearchError};
use super::vectordb::{Hit, VectorIndex};
use crate::core::catalog::Catalog;
use crate::core::config::{EngineConfig, PoolStrategy};

/// One unique gadget with its best score in a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "gadget_name")]
    pub name: String,
    pub function: String,
    #[serde(rename = "similarity")]
    pub score: f32,
}

/// Sizes of the loaded artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub model: String,
    pub dimension: usize,
    pub index_rows: usize,
    pub catalog_rows: usize,
    pub unique_names: usize,
}

/// Loaded, read-only search engine.
///
/// Everything is loaded by [`SearchEngine::open`]; `search` takes `&self`
/// and the engine can be shared across threads.
pub struct SearchEngine {
    embedder: Box<dyn Embedder>,
    index: VectorIndex,
    catalog: Catalog,
    config: EngineConfig,
}

impl SearchEngine {
    /// Results returned when the caller does not ask for a count
    pub const DEFAULT_K: usize = 5;

    /// Load index, catalog and the configured embedding model
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let embedder = EmbeddingModel::load(&config.model)?;
        Self::open_with_embedder(config, Box::new(embedder))
    }

    /// Load index and catalog, using `embedder` for queries
    pub fn open_with_embedder(config: &EngineConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        let paths = config.paths();
        info!(prefix = %paths.prefix.display(), "Loading search engine");

        let index = VectorIndex::open(&paths.index)?;
        let catalog = Catalog::load(&paths.catalog)?;

        let engine = Self::from_parts(config.clone(), embedder, index, catalog)?;
        info!(
            rows = engine.index.len(),
            unique_names = engine.catalog.unique_names(),
            model = engine.embedder.model_id(),
            "Search engine loaded"
        );
        Ok(engine)
    }

    /// Assemble an engine from already loaded parts.
    ///
    /// Fails if the index and catalog differ in row count or the index
    /// dimension does not match the embedder.
    pub fn from_parts(
        config: EngineConfig,
        embedder: Box<dyn Embedder>,
        index: VectorIndex,
        catalog: Catalog,
    ) -> Result<Self> {
        if index.len() != catalog.len() {
            return Err(LoadError::CardinalityMismatch {
                index_rows: index.len(),
                catalog_rows: catalog.len(),
            }
            .into());
        }

        if !index.is_empty() && index.dimension() != embedder.dimension() {
            return Err(LoadError::DimensionMismatch {
                model: embedder.model_id().to_string(),
                index: index.dimension(),
                model_dim: embedder.dimension(),
            }
            .into());
        }

        if let Some(built_with) = index.model() {
            if built_with != embedder.model_id() {
                warn!(
                    index_model = built_with,
                    query_model = embedder.model_id(),
                    "Index was built with a different embedding model; scores may be meaningless"
                );
            }
        }

        Ok(Self {
            embedder,
            index,
            catalog,
            config,
        })
    }

    /// Top `k` unique gadgets for `query`, best first.
    ///
    /// Returns fewer than `k` results when the candidate pool does not hold
    /// `k` distinct names; that is not an error.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(SearchError::invalid_argument("k must be at least 1"));
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::invalid_argument("query must not be empty"));
        }

        let mut query_vector = self.embedder.encode(query)?;
        normalize_l2(&mut query_vector);

        // Slots past the last row can only be sentinels
        let mut pool_size = self.config.pool_size(k).min(self.index.len());
        loop {
            let hits = self.index.search(&query_vector, pool_size)?;
            let results = unique_top_k(&hits, &self.catalog, k);

            let exhausted = pool_size >= self.index.len();
            if results.len() < k && !exhausted && self.config.strategy == PoolStrategy::Adaptive
            {
                pool_size = pool_size.saturating_mul(2).min(self.index.len());
                debug!(found = results.len(), k, pool_size, "Growing candidate pool");
                continue;
            }

            debug!(query, k, pool_size, found = results.len(), "Search complete");
            return Ok(results);
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            model: self.embedder.model_id().to_string(),
            dimension: self.embedder.dimension(),
            index_rows: self.index.len(),
            catalog_rows: self.catalog.len(),
            unique_names: self.catalog.unique_names(),
        }
    }

    /// Release the loaded index, catalog and model
    pub fn close(self) {
        info!(rows = self.index.len(), "Closing search engine");
    }
}

/// Walk `hits` in order, keeping the first occurrence of each gadget name.
///
/// `hits` must be sorted by descending score, so the first occurrence is
/// the best one. Sentinel rows and rows outside the catalog are skipped.
/// Stops once `k` names are accepted.
pub fn unique_top_k(hits: &[Hit], catalog: &Catalog, k: usize) -> Vec<SearchResult> {
    let capacity = k.min(hits.len());
    let mut results = Vec::with_capacity(capacity);
    let mut seen: HashSet<&str> = HashSet::with_capacity(capacity);

    for hit in hits {
        if results.len() >= k {
            break;
        }
        if hit.is_empty() {
            continue;
        }

        let Some(item) = usize::try_from(hit.row).ok().and_then(|id| catalog.row(id)) else {
            warn!(row = hit.row, "Index returned a row outside the catalog");
            continue;
        };

        if seen.insert(item.name.as_str()) {
            results.push(SearchResult {
                name: item.name.clone(),
                function: item.function.clone(),
                score: hit.score,
            });
        }
    }

    results
}
