//! Bounded query history
//!
//! Most recent first, no duplicates, written back to the key-value store on
//! every change. Store failures are logged; the in-memory list stays
//! authoritative.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::search::normalize_history_entry;
use crate::storage::{KeyValueStore, HISTORY_KEY};

pub struct SearchHistory {
    entries: Mutex<Vec<String>>,
    store: Arc<dyn KeyValueStore>,
    max_entries: usize,
}

impl SearchHistory {
    /// Empty history that does not read the store
    pub fn new(store: Arc<dyn KeyValueStore>, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            store,
            max_entries,
        }
    }

    /// History rehydrated from the store
    pub fn load(store: Arc<dyn KeyValueStore>, max_entries: usize) -> Self {
        let history = Self::new(store, max_entries);
        let loaded = history.read_persisted();
        *history.entries.lock() = loaded;
        history
    }

    fn read_persisted(&self) -> Vec<String> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load search history: {}", e);
                return Vec::new();
            }
        };

        let stored: Vec<String> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Discarding unreadable search history: {}", e);
                return Vec::new();
            }
        };

        let mut entries: Vec<String> = Vec::with_capacity(self.max_entries);
        for query in stored {
            let query = normalize_history_entry(&query);
            if query.is_empty() || entries.contains(&query) {
                continue;
            }
            entries.push(query);
            if entries.len() >= self.max_entries {
                break;
            }
        }
        entries
    }

    /// Record a query as the most recent one
    pub fn add(&self, query: &str) {
        let query = normalize_history_entry(query);
        if query.is_empty() {
            return;
        }

        let mut entries = self.entries.lock();
        entries.retain(|existing| existing != &query);
        entries.insert(0, query);
        entries.truncate(self.max_entries);
        self.persist(&entries);
    }

    /// Snapshot, most recent first
    pub fn list(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

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

    fn persist(&self, entries: &[String]) {
        let result = serde_json::to_string(entries)
            .map_err(crate::error::PoetryError::from)
            .and_then(|json| self.store.set(HISTORY_KEY, &json));

        if let Err(e) = result {
            tracing::warn!(
                "Failed to save search history to {} store: {}",
                self.store.backend_name(),
                e
            );
        }
    }
}
