//! Search result caching with TTL expiry and persistence
//!
//! Provides caching for ranked result lists with:
//! - Canonical fingerprints of (normalized query, filter options)
//! - TTL-based expiration, lazy on access and eager on sweep
//! - Write-back to a [`KeyValueStore`] after every mutation
//! - Rehydration on startup, dropping stale and malformed entries
//!
//! Persisted entries reference poems by id and are re-bound to the corpus
//! on load, so cached results share records with fresh ones.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::SearchConfig;
use crate::clock::Clock;
use crate::corpus::Corpus;
use crate::storage::{KeyValueStore, CACHE_KEY};
use crate::types::{MatchType, MatchedField, SearchOptions, SearchResult};

/// Option fields that take part in the cache fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheFilterParams {
    pub dynasty: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    /// Sorted and deduplicated
    pub tags: Vec<String>,
    pub limit: usize,
    pub min_score: f32,
    pub fuzzy: bool,
}

impl CacheFilterParams {
    /// Canonicalize options, resolving unset ranking parameters from `config`
    pub fn from_options(options: &SearchOptions, config: &SearchConfig) -> Self {
        let mut tags = options.tags.clone().unwrap_or_default();
        tags.sort();
        tags.dedup();

        Self {
            dynasty: options.dynasty.clone(),
            category: options.category.clone(),
            author: options.author.clone(),
            tags,
            limit: options.limit.unwrap_or(config.default_limit),
            min_score: options.min_score.unwrap_or(config.default_min_score),
            fuzzy: options.fuzzy.unwrap_or(true),
        }
    }
}

/// A cached result list
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Query as the caller typed it
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl CacheEntry {
    /// Entries are valid while `now - timestamp < ttl`
    pub fn is_expired(&self, now: i64, ttl_millis: i64) -> bool {
        now - self.timestamp >= ttl_millis
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResult {
    poem_id: String,
    score: f32,
    match_type: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    highlight: Option<String>,
    #[serde(default)]
    matched_fields: Vec<MatchedField>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCacheEntry {
    query: String,
    results: Vec<StoredResult>,
    timestamp: i64,
}

impl StoredCacheEntry {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            query: entry.query.clone(),
            results: entry
                .results
                .iter()
                .map(|r| StoredResult {
                    poem_id: r.poem.id.clone(),
                    score: r.score,
                    match_type: r.match_type,
                    highlight: r.highlight.clone(),
                    matched_fields: r.matched_fields.clone(),
                })
                .collect(),
            timestamp: entry.timestamp,
        }
    }

    /// Re-bind to corpus records; `None` if any poem id is unknown
    fn into_entry(self, corpus: &Corpus) -> Option<CacheEntry> {
        let results = self
            .results
            .into_iter()
            .map(|r| {
                corpus.get(&r.poem_id).map(|poem| SearchResult {
                    poem: Arc::clone(poem),
                    score: r.score,
                    match_type: r.match_type,
                    highlight: r.highlight,
                    matched_fields: r.matched_fields,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(CacheEntry {
            query: self.query,
            results,
            timestamp: self.timestamp,
        })
    }
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub ttl_seconds: u64,
}

/// Persisted TTL cache of ranked result lists
pub struct SearchResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_seconds: u64,
    max_entries: usize,
    stats: CacheStats,
}

impl SearchResultCache {
    /// Create an empty cache without reading the store
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &SearchConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            store,
            clock,
            ttl_seconds: config.cache_ttl_seconds,
            max_entries: config.max_cache_entries,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache and rehydrate the still-valid persisted entries
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        corpus: &Corpus,
        config: &SearchConfig,
    ) -> Self {
        let cache = Self::new(store, clock, config);
        let loaded = cache.read_persisted(corpus);
        if !loaded.is_empty() {
            tracing::debug!("Rehydrated {} cached searches", loaded.len());
        }
        *cache.entries.lock() = loaded;
        cache
    }

    fn read_persisted(&self, corpus: &Corpus) -> HashMap<String, CacheEntry> {
        let mut loaded = HashMap::new();

        let raw = match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return loaded,
            Err(e) => {
                tracing::warn!("Failed to load search cache: {}", e);
                return loaded;
            }
        };

        let document: serde_json::Map<String, serde_json::Value> =
            match serde_json::from_str(&raw) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Discarding unreadable search cache: {}", e);
                    return loaded;
                }
            };

        let now = self.clock.now_millis();
        let ttl = self.ttl_millis();
        for (key, value) in document {
            let stored: StoredCacheEntry = match serde_json::from_value(value) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!("Dropping malformed cache entry {:?}: {}", key, e);
                    continue;
                }
            };
            let Some(entry) = stored.into_entry(corpus) else {
                tracing::warn!("Dropping cache entry {:?} for poems not in corpus", key);
                continue;
            };
            if !entry.is_expired(now, ttl) {
                loaded.insert(key, entry);
            }
        }

        if loaded.len() > self.max_entries {
            let mut by_age: Vec<(String, i64)> = loaded
                .iter()
                .map(|(k, e)| (k.clone(), e.timestamp))
                .collect();
            by_age.sort_by_key(|(_, ts)| std::cmp::Reverse(*ts));
            for (key, _) in by_age.into_iter().skip(self.max_entries) {
                loaded.remove(&key);
            }
        }

        loaded
    }

    fn ttl_millis(&self) -> i64 {
        (self.ttl_seconds as i64).saturating_mul(1000)
    }

    /// Generate the fingerprint of a normalized query and options
    pub fn cache_key(normalized_query: &str, filters: &CacheFilterParams) -> String {
        let mut parts = vec![normalized_query.to_string()];
        if let Some(dynasty) = &filters.dynasty {
            parts.push(format!("dynasty:{}", dynasty));
        }
        if let Some(category) = &filters.category {
            parts.push(format!("category:{}", category));
        }
        if let Some(author) = &filters.author {
            parts.push(format!("author:{}", author));
        }
        if !filters.tags.is_empty() {
            parts.push(format!("tags:{}", filters.tags.join(",")));
        }
        parts.push(format!("limit:{}", filters.limit));
        parts.push(format!("min_score:{}", filters.min_score));
        parts.push(format!("fuzzy:{}", filters.fuzzy));
        parts.join("|")
    }

    /// Look up a valid entry; an expired one is removed
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl_millis()) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.persist(&entries);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store an entry, evicting the oldest one when at capacity
    pub fn put(&self, key: impl Into<String>, entry: CacheEntry) {
        let key = key.into();
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            Self::evict_oldest(&mut entries, &self.stats);
        }
        if self.max_entries > 0 {
            entries.insert(key, entry);
        }
        self.persist(&entries);
    }

    /// Store freshly ranked results stamped with the current time
    pub fn insert(&self, key: impl Into<String>, query: &str, results: Vec<SearchResult>) {
        let entry = CacheEntry {
            query: query.to_string(),
            results,
            timestamp: self.clock.now_millis(),
        };
        self.put(key, entry);
    }

    fn evict_oldest(entries: &mut HashMap<String, CacheEntry>, stats: &CacheStats) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.timestamp)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            entries.remove(&key);
            stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove expired entries and persist what remains
    pub fn sweep(&self) {
        let now = self.clock.now_millis();
        let ttl = self.ttl_millis();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        self.persist(&entries);
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.persist(&entries);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStatsResponse {
        CacheStatsResponse {
            entries: self.len(),
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            hit_rate: self.stats.hit_rate(),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            ttl_seconds: self.ttl_seconds,
        }
    }

    /// Write the whole cache back; failures are logged and ignored
    fn persist(&self, entries: &HashMap<String, CacheEntry>) {
        let document: BTreeMap<&str, StoredCacheEntry> = entries
            .iter()
            .map(|(key, entry)| (key.as_str(), StoredCacheEntry::from_entry(entry)))
            .collect();

        let result = serde_json::to_string(&document)
            .map_err(crate::error::PoetryError::from)
            .and_then(|json| self.store.set(CACHE_KEY, &json));

        if let Err(e) = result {
            tracing::warn!(
                "Failed to save search cache to {} store: {}",
                self.store.backend_name(),
                e
            );
        }
    }
}
