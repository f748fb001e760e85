//! Search facade
//!
//! [`PoetrySearchService`] ties the pieces together: it normalizes the
//! query, records history, consults the result cache, ranks on a miss and
//! answers the aggregation queries. Construct it once at startup and share
//! it by reference or `Arc`.

use std::sync::Arc;
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::corpus::Corpus;
use crate::history::SearchHistory;
use crate::search::{
    author_distribution, category_distribution, corpus_totals, normalize_query, rank, suggest,
    tag_distribution, CacheFilterParams, CacheStatsResponse, SearchConfig, SearchResultCache,
};
use crate::storage::KeyValueStore;
use crate::types::{
    AuthorCount, CategoryCount, SearchOptions, SearchResult, SearchStats, TagCount,
};

pub const DEFAULT_POPULAR_TAGS: usize = 20;
pub const DEFAULT_POPULAR_AUTHORS: usize = 20;
pub const DEFAULT_POPULAR_CATEGORIES: usize = 10;

pub struct PoetrySearchService {
    corpus: Arc<Corpus>,
    cache: SearchResultCache,
    history: SearchHistory,
    config: SearchConfig,
}

impl PoetrySearchService {
    /// Create a service on the system clock, rehydrating history and cache
    /// from `store`
    pub fn new(corpus: Arc<Corpus>, store: Arc<dyn KeyValueStore>, config: SearchConfig) -> Self {
        Self::with_clock(corpus, store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        corpus: Arc<Corpus>,
        store: Arc<dyn KeyValueStore>,
        config: SearchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = SearchResultCache::load(Arc::clone(&store), clock, &corpus, &config);
        let history = SearchHistory::load(store, config.max_history);
        Self {
            corpus,
            cache,
            history,
            config,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search the local corpus
    ///
    /// Blank queries return nothing and are not recorded. Every other query
    /// goes to history even when the answer comes from the cache.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        self.history.add(query);

        let normalized = normalize_query(query);
        if normalized.is_empty() {
            tracing::debug!("Query {:?} has no searchable characters", query);
            return Vec::new();
        }

        let filters = CacheFilterParams::from_options(options, &self.config);
        let key = SearchResultCache::cache_key(&normalized, &filters);

        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!(
                "Cache hit for {:?}: {} results in {:?}",
                key,
                entry.results.len(),
                start.elapsed()
            );
            return entry.results;
        }

        let results = rank(&self.corpus, &normalized, options, &self.config);
        self.cache.insert(key.as_str(), query, results.clone());
        self.cache.sweep();

        let elapsed = start.elapsed();
        tracing::debug!(
            "Ranked {:?}: {} results in {:?}",
            key,
            results.len(),
            elapsed
        );
        if elapsed.as_millis() > u128::from(self.config.slow_search_ms) {
            tracing::warn!(
                "Slow search {:?} took {:?} over {} poems",
                normalized,
                elapsed,
                self.corpus.len()
            );
        }

        results
    }

    /// Search with optional remote augmentation
    ///
    /// There is no remote source; this returns the local results whatever
    /// `include_network` says.
    pub fn search_with_network(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        if options.include_network {
            tracing::debug!("Network search requested; serving local results only");
        }
        self.search(query, options)
    }

    /// Recent queries, most recent first
    pub fn history(&self) -> Vec<String> {
        self.history.list()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn popular_tags(&self, limit: Option<usize>) -> Vec<TagCount> {
        tag_distribution(&self.corpus, limit.unwrap_or(DEFAULT_POPULAR_TAGS))
    }

    pub fn popular_authors(&self, limit: Option<usize>) -> Vec<AuthorCount> {
        author_distribution(&self.corpus, limit.unwrap_or(DEFAULT_POPULAR_AUTHORS))
    }

    pub fn popular_categories(&self, limit: Option<usize>) -> Vec<CategoryCount> {
        category_distribution(&self.corpus, limit.unwrap_or(DEFAULT_POPULAR_CATEGORIES))
    }

    pub fn search_stats(&self) -> SearchStats {
        let totals = corpus_totals(&self.corpus);
        SearchStats {
            total_poetry: totals.poems,
            total_authors: totals.authors,
            total_tags: totals.tags,
            cache_size: self.cache.len(),
        }
    }

    /// Up to five titles or authors containing the query
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        suggest(&self.corpus, query)
    }

    pub fn cache_stats(&self) -> CacheStatsResponse {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{MemoryStore, CACHE_KEY, HISTORY_KEY};
    use crate::types::{MatchType, Poem};

    const T0: i64 = 1_700_000_000_000;

    fn poem(id: &str, title: &str, author: &str, dynasty: &str, content: &[&str]) -> Poem {
        Poem {
            id: id.to_string(),
            title: title.to_string(),
            content: content.iter().map(|s| s.to_string()).collect(),
            author: author.to_string(),
            dynasty: dynasty.to_string(),
            tags: None,
            origin: None,
            category: None,
        }
    }

    fn corpus() -> Arc<Corpus> {
        let mut chunxiao = poem("2", "春晓", "孟浩然", "唐", &["春眠不觉晓", "处处闻啼鸟"]);
        chunxiao.tags = Some(vec!["春天".to_string(), "写景".to_string()]);
        chunxiao.category = Some("五言绝句".to_string());

        let mut shuidiao = poem("3", "水调歌头", "苏轼", "宋", &["明月几时有", "把酒问青天"]);
        shuidiao.tags = Some(vec!["中秋".to_string(), "明月".to_string()]);
        shuidiao.category = Some("词".to_string());

        let mut jingyesi = poem("1", "静夜思", "李白", "唐", &["床前明月光", "疑是地上霜"]);
        jingyesi.tags = Some(vec!["思乡".to_string(), "月亮".to_string()]);
        jingyesi.category = Some("五言绝句".to_string());

        Arc::new(Corpus::new(vec![jingyesi, chunxiao, shuidiao]).unwrap())
    }

    fn service() -> (Arc<MemoryStore>, Arc<ManualClock>, PoetrySearchService) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let service = PoetrySearchService::with_clock(
            corpus(),
            store.clone(),
            SearchConfig::default(),
            clock.clone(),
        );
        (store, clock, service)
    }

    #[test]
    fn test_search_author() {
        let (_, _, service) = service();
        let results = service.search("李白", &SearchOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Exact);
        assert!((results[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_blank_query_not_recorded() {
        let (store, _, service) = service();
        assert!(service.search("   ", &SearchOptions::default()).is_empty());
        assert!(service.history().is_empty());
        assert!(store.get(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_punctuation_query_recorded_but_not_cached() {
        let (_, _, service) = service();
        assert!(service.search("，。！", &SearchOptions::default()).is_empty());
        assert_eq!(service.history(), vec!["，。！".to_string()]);
        assert_eq!(service.cache_stats().entries, 0);
    }

    #[test]
    fn test_repeat_search_served_from_cache() {
        let (_, _, service) = service();
        let first = service.search("明月", &SearchOptions::default());
        let second = service.search("明月", &SearchOptions::default());
        assert_eq!(first, second);

        let stats = service.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        // recorded once, deduplicated
        assert_eq!(service.history(), vec!["明月".to_string()]);
    }

    #[test]
    fn test_cache_hit_still_moves_query_to_front_of_history() {
        let (_, _, service) = service();
        service.search("明月", &SearchOptions::default());
        service.search("春", &SearchOptions::default());
        assert_eq!(service.history(), vec!["春".to_string(), "明月".to_string()]);

        service.search("明月", &SearchOptions::default());
        assert_eq!(service.cache_stats().hits, 1);
        assert_eq!(service.history(), vec!["明月".to_string(), "春".to_string()]);
    }

    #[test]
    fn test_tag_order_shares_cache_entry() {
        let (_, _, service) = service();
        let a = SearchOptions::default().with_tags(["月亮", "思乡"]);
        let b = SearchOptions::default().with_tags(["思乡", "月亮"]);
        service.search("明月", &a);
        service.search("明月", &b);
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[test]
    fn test_different_limit_is_a_different_entry() {
        let (_, _, service) = service();
        let all = service.search("明月", &SearchOptions::default());
        let one = service.search("明月", &SearchOptions::default().with_limit(1));
        assert_eq!(all.len(), 2);
        assert_eq!(one.len(), 1);
        assert_eq!(service.cache_stats().entries, 2);
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let (_, clock, service) = service();
        service.search("春", &SearchOptions::default());
        clock.advance(300_000 + 1);
        service.search("春", &SearchOptions::default());
        let stats = service.cache_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_state_survives_restart() {
        let (store, clock, service) = service();
        service.search("李白", &SearchOptions::default());
        drop(service);

        assert!(store.get(CACHE_KEY).unwrap().is_some());
        let restarted = PoetrySearchService::with_clock(
            corpus(),
            store,
            SearchConfig::default(),
            clock,
        );
        assert_eq!(restarted.history(), vec!["李白".to_string()]);
        assert_eq!(restarted.cache_stats().entries, 1);

        let results = restarted.search("李白", &SearchOptions::default());
        assert_eq!(results[0].poem.title, "静夜思");
        assert_eq!(restarted.cache_stats().hits, 1);
    }

    #[test]
    fn test_clear_history_and_cache() {
        let (_, _, service) = service();
        service.search("春", &SearchOptions::default());
        service.clear_history();
        service.clear_cache();
        assert!(service.history().is_empty());
        assert_eq!(service.search_stats().cache_size, 0);
    }

    #[test]
    fn test_network_search_is_local() {
        let (_, _, service) = service();
        let options = SearchOptions {
            include_network: true,
            ..SearchOptions::default()
        };
        let results = service.search_with_network("李白", &options);
        assert_eq!(results, service.search("李白", &SearchOptions::default()));
    }

    #[test]
    fn test_aggregations() {
        let (_, _, service) = service();
        let categories = service.popular_categories(None);
        assert_eq!(categories[0].category, "五言绝句");
        assert_eq!(categories[0].count, 2);
        assert_eq!(service.popular_tags(Some(2)).len(), 2);
        assert_eq!(service.popular_authors(None).len(), 3);

        let stats = service.search_stats();
        assert_eq!(stats.total_poetry, 3);
        assert_eq!(stats.total_authors, 3);
        assert_eq!(stats.total_tags, 6);
        assert_eq!(stats.cache_size, 0);
    }

    #[test]
    fn test_suggestions() {
        let (_, _, service) = service();
        assert_eq!(service.suggestions("水调"), vec!["水调歌头".to_string()]);
        assert!(service.suggestions("水").is_empty());
    }
}
