//! Search functionality for poetry-search
//!
//! Implements:
//! - Query normalization
//! - Field scoring with a positional fuzzy fallback
//! - Weighted ranking over the in-memory corpus
//! - TTL result caching with persistence
//! - Aggregation queries (popular tags/authors/categories, suggestions)

mod aggregation;
mod fuzzy;
mod normalize;
mod ranking;
mod result_cache;

pub use aggregation::*;
pub use fuzzy::*;
pub use normalize::*;
pub use ranking::*;
pub use result_cache::*;

use serde::{Deserialize, Serialize};

/// Weight applied to each field's score before taking the maximum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f32,
    pub author: f32,
    pub content: f32,
    pub tag: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 1.0,
            author: 0.9,
            content: 0.7,
            tag: 0.8,
        }
    }
}

/// Configuration for search, caching and history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit when a call sets none
    pub default_limit: usize,
    /// Minimum score when a call sets none
    pub default_min_score: f32,
    /// Lifetime of a cached result list, in seconds
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached result lists
    pub max_cache_entries: usize,
    /// Maximum number of remembered queries
    pub max_history: usize,
    /// Searches slower than this are logged as warnings
    pub slow_search_ms: u64,
    pub weights: FieldWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            default_min_score: 0.3,
            cache_ttl_seconds: 300, // 5 minutes
            max_cache_entries: 100,
            max_history: 10,
            slow_search_ms: 300,
            weights: FieldWeights::default(),
        }
    }
}

impl SearchConfig {
    pub fn cache_ttl_millis(&self) -> i64 {
        (self.cache_ttl_seconds as i64).saturating_mul(1000)
    }
}
