//! Engine configuration

use std::path::PathBuf;

use super::paths::{StoragePaths, DEFAULT_PREFIX};
use crate::search::embedding::HTP_MODEL_ID;

/// Candidate pool multiplier used when none is configured
pub const DEFAULT_OVERFETCH: usize = 5;

/// How many candidates to pull from the index per search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolStrategy {
    /// One request of `k * overfetch` candidates. May return fewer than
    /// `k` results when one name dominates the top of the ranking.
    #[default]
    Fixed,
    /// Start at `k * overfetch` and double until `k` unique names are found
    /// or the whole index has been scanned.
    Adaptive,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the index file and catalog table
    pub prefix: PathBuf,
    /// Embedding model identifier
    pub model: String,
    /// Candidate pool multiplier, at least 1
    pub overfetch: usize,
    pub strategy: PoolStrategy,
}

impl EngineConfig {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_overfetch(mut self, overfetch: usize) -> Self {
        self.overfetch = overfetch.max(1);
        self
    }

    pub fn with_strategy(mut self, strategy: PoolStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn paths(&self) -> StoragePaths {
        StoragePaths::from_prefix(&self.prefix)
    }

    /// Candidates requested for the first pass of a `k`-result search
    pub fn pool_size(&self, k: usize) -> usize {
        k.saturating_mul(self.overfetch.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from(DEFAULT_PREFIX),
            model: HTP_MODEL_ID.to_string(),
            overfetch: DEFAULT_OVERFETCH,
            strategy: PoolStrategy::Fixed,
        }
    }
}
