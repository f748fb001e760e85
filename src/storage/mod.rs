//! Persistence for poetry-search
//!
//! A minimal key-value surface (get/set/remove of string blobs). The search
//! core stores query history and cached results through it.

mod backend;
mod file_backend;

pub use backend::{KeyValueStore, MemoryStore};
pub use file_backend::FileStore;

/// Storage key for the query history (JSON array of strings)
pub const HISTORY_KEY: &str = "poetry_search_history";

/// Storage key for the result cache (JSON object keyed by fingerprint)
pub const CACHE_KEY: &str = "poetry_search_cache";
