//! Weighted ranking over the corpus
//!
//! A linear scan: every query visits every poem and its content lines. There
//! is no index; the corpus is small and static.

use std::sync::Arc;

use super::fuzzy::{field_score, EXACT_SCORE};
use super::SearchConfig;
use crate::corpus::Corpus;
use crate::types::{MatchType, MatchedField, Poem, SearchOptions, SearchResult};

/// Match type accumulated while fields are evaluated in order
/// (title, author, content, tags)
///
/// Once any field scores exactly 1.0 the state stays `Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct MatchTypeState(MatchType);

impl MatchTypeState {
    fn observe_title(&mut self, score: f32) {
        if score <= 0.0 || self.0 == MatchType::Exact {
            return;
        }
        self.0 = if score == EXACT_SCORE {
            MatchType::Exact
        } else {
            MatchType::Partial
        };
    }

    fn observe(&mut self, score: f32) {
        if score == EXACT_SCORE {
            self.0 = MatchType::Exact;
        }
    }
}

/// Rank the corpus against a normalized query
///
/// Returns at most `limit` results with `score >= min_score`, best first.
/// Ties keep corpus order. An empty query matches nothing.
pub fn rank(
    corpus: &Corpus,
    normalized_query: &str,
    options: &SearchOptions,
    config: &SearchConfig,
) -> Vec<SearchResult> {
    if normalized_query.is_empty() {
        return Vec::new();
    }

    let fuzzy = options.fuzzy.unwrap_or(true);
    let limit = options.limit.unwrap_or(config.default_limit);
    let min_score = options.min_score.unwrap_or(config.default_min_score);

    let mut results: Vec<SearchResult> = corpus
        .iter()
        .filter(|poem| passes_filters(poem, options))
        .map(|poem| score_poem(poem, normalized_query, fuzzy, config))
        .filter(|result| result.score >= min_score)
        .collect();

    // sort_by is stable, so equal scores keep corpus order
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}

/// Structural filters: dynasty, category, author equality and tag overlap
pub fn passes_filters(poem: &Poem, options: &SearchOptions) -> bool {
    if let Some(dynasty) = &options.dynasty {
        if &poem.dynasty != dynasty {
            return false;
        }
    }
    if let Some(category) = &options.category {
        if poem.category.as_ref() != Some(category) {
            return false;
        }
    }
    if let Some(author) = &options.author {
        if &poem.author != author {
            return false;
        }
    }
    if let Some(tags) = &options.tags {
        if !tags.is_empty() && !poem.has_any_tag(tags) {
            return false;
        }
    }
    true
}

/// Score one poem; a poem with no matching field scores 0 as `Fuzzy`
fn score_poem(poem: &Arc<Poem>, query: &str, fuzzy: bool, config: &SearchConfig) -> SearchResult {
    let weights = &config.weights;
    let mut max_score = 0.0f32;
    let mut state = MatchTypeState::default();
    let mut matched_fields: Vec<MatchedField> = Vec::new();

    let title_score = field_score(&poem.title, query, fuzzy);
    if title_score > 0.0 {
        max_score = max_score.max(title_score * weights.title);
        state.observe_title(title_score);
        push_unique(&mut matched_fields, MatchedField::Title);
    }

    let author_score = field_score(&poem.author, query, fuzzy);
    if author_score > 0.0 {
        max_score = max_score.max(author_score * weights.author);
        state.observe(author_score);
        push_unique(&mut matched_fields, MatchedField::Author);
    }

    if let Some(content_score) = poem
        .content
        .iter()
        .map(|line| field_score(line, query, fuzzy))
        .find(|&score| score > 0.0)
    {
        max_score = max_score.max(content_score * weights.content);
        state.observe(content_score);
        push_unique(&mut matched_fields, MatchedField::Content);
    }

    for tag in poem.tags() {
        let tag_score = field_score(tag, query, fuzzy);
        if tag_score > 0.0 {
            max_score = max_score.max(tag_score * weights.tag);
            state.observe(tag_score);
            push_unique(&mut matched_fields, MatchedField::Tag(tag.clone()));
        }
    }

    SearchResult {
        poem: Arc::clone(poem),
        score: max_score,
        match_type: state.0,
        highlight: build_highlight(poem, query),
        matched_fields,
    }
}

fn push_unique(fields: &mut Vec<MatchedField>, field: MatchedField) {
    if !fields.contains(&field) {
        fields.push(field);
    }
}

/// Title, author and the first content line that contain the query,
/// joined by `" | "`
///
/// Containment is checked on the lowercased raw text, punctuation included,
/// so a field matched only after normalization contributes no snippet.
pub fn build_highlight(poem: &Poem, query: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    if poem.title.to_lowercase().contains(query) {
        parts.push(&poem.title);
    }
    if poem.author.to_lowercase().contains(query) {
        parts.push(&poem.author);
    }
    if let Some(line) = poem
        .content
        .iter()
        .find(|line| line.to_lowercase().contains(query))
    {
        parts.push(line);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn sample_corpus() -> Corpus {
        let mut chunxiao = poem("2", "春晓", "孟浩然", "唐", &["春眠不觉晓", "处处闻啼鸟"]);
        chunxiao.tags = Some(vec!["春天".to_string(), "写景".to_string()]);
        chunxiao.category = Some("五言绝句".to_string());

        let mut shuidiao = poem(
            "3",
            "水调歌头",
            "苏轼",
            "宋",
            &["明月几时有", "把酒问青天"],
        );
        shuidiao.tags = Some(vec!["中秋".to_string(), "明月".to_string()]);

        Corpus::new(vec![
            poem("1", "静夜思", "李白", "唐", &["床前明月光", "疑是地上霜"]),
            chunxiao,
            shuidiao,
        ])
        .unwrap()
    }

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn test_author_exact_match() {
        let results = rank(&sample_corpus(), "李白", &SearchOptions::default(), &config());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].poem.title, "静夜思");
        assert_eq!(results[0].match_type, MatchType::Exact);
        assert!((results[0].score - 0.9).abs() < 1e-6);
        assert_eq!(results[0].highlight.as_deref(), Some("李白"));
        assert_eq!(results[0].matched_fields, vec![MatchedField::Author]);
    }

    #[test]
    fn test_content_substring_match() {
        let results = rank(&sample_corpus(), "明月", &SearchOptions::default(), &config());
        let jingyesi = results.iter().find(|r| r.poem.id == "1").unwrap();
        assert_ne!(jingyesi.match_type, MatchType::Exact);
        assert!((jingyesi.score - 0.85 * 0.7).abs() < 1e-6);
        assert_eq!(jingyesi.highlight.as_deref(), Some("床前明月光"));

        // the tag "明月" is an exact match worth 0.8
        let shuidiao = &results[0];
        assert_eq!(shuidiao.poem.id, "3");
        assert_eq!(shuidiao.match_type, MatchType::Exact);
        assert!((shuidiao.score - 0.8).abs() < 1e-6);
        assert!(shuidiao
            .matched_fields
            .contains(&MatchedField::Tag("明月".to_string())));
    }

    #[test]
    fn test_title_partial_then_exact_latch() {
        let mut p = poem("9", "明月", "佚名", "唐", &["明月"]);
        p.title = "明月夜".to_string();
        let corpus = Corpus::new(vec![p]).unwrap();

        let results = rank(&corpus, "明月", &SearchOptions::default(), &config());
        // title substring would be partial, exact content line latches exact
        assert_eq!(results[0].match_type, MatchType::Exact);
        assert!((results[0].score - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_title_partial_match_type() {
        let results = rank(&sample_corpus(), "春", &SearchOptions::default(), &config());
        let chunxiao = results.iter().find(|r| r.poem.id == "2").unwrap();
        assert_eq!(chunxiao.match_type, MatchType::Partial);
        assert_eq!(chunxiao.highlight.as_deref(), Some("春晓 | 春眠不觉晓"));
    }

    #[test]
    fn test_dynasty_filter() {
        let options = SearchOptions::default().with_dynasty("宋");
        let results = rank(&sample_corpus(), "明月", &options, &config());
        assert!(results.iter().all(|r| r.poem.dynasty == "宋"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_tag_and_category_filters() {
        let options = SearchOptions::default().with_tags(["写景", "边塞"]);
        let results = rank(&sample_corpus(), "春", &options, &config());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].poem.id, "2");

        let options = SearchOptions::default().with_category("七言律诗");
        assert!(rank(&sample_corpus(), "春", &options, &config()).is_empty());

        let empty_tags = SearchOptions::default().with_tags(Vec::<String>::new());
        assert!(!rank(&sample_corpus(), "春", &empty_tags, &config()).is_empty());
    }

    #[test]
    fn test_min_score_and_limit() {
        let options = SearchOptions::default().with_min_score(0.81);
        let results = rank(&sample_corpus(), "明月", &options, &config());
        assert!(results.is_empty());

        let options = SearchOptions::default().with_limit(1);
        let results = rank(&sample_corpus(), "明月", &options, &config());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let corpus = Corpus::new(vec![
            poem("a", "秋思", "甲", "唐", &[]),
            poem("b", "秋思", "乙", "唐", &[]),
        ])
        .unwrap();
        let results = rank(&corpus, "秋思", &SearchOptions::default(), &config());
        let ids: Vec<&str> = results.iter().map(|r| r.poem.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        assert!(rank(&sample_corpus(), "", &SearchOptions::default(), &config()).is_empty());
    }

    #[test]
    fn test_non_fuzzy_requires_substring() {
        let options = SearchOptions::default().with_fuzzy(false);
        assert!(rank(&sample_corpus(), "静夜诗", &options, &config()).is_empty());

        let fuzzy = rank(&sample_corpus(), "静夜诗", &SearchOptions::default(), &config());
        assert_eq!(fuzzy[0].poem.id, "1");
        assert_eq!(fuzzy[0].match_type, MatchType::Partial);
        assert!(fuzzy[0].highlight.is_none());
    }

    #[test]
    fn test_zero_min_score_keeps_unmatched_poems() {
        let corpus = Corpus::new(vec![
            poem("1", "静夜思", "李白", "唐", &["床前明月光"]),
            poem("2", "江雪", "柳宗元", "唐", &["千山鸟飞绝"]),
        ])
        .unwrap();
        let options = SearchOptions::default().with_min_score(0.0);
        let results = rank(&corpus, "李白", &options, &config());
        assert_eq!(results.len(), 2);

        let jiangxue = &results[1];
        assert_eq!(jiangxue.poem.id, "2");
        assert_eq!(jiangxue.score, 0.0);
        assert_eq!(jiangxue.match_type, MatchType::Fuzzy);
        assert!(jiangxue.matched_fields.is_empty());
        assert!(jiangxue.highlight.is_none());

        // the default threshold still drops it
        assert_eq!(rank(&corpus, "李白", &SearchOptions::default(), &config()).len(), 1);
    }

    #[test]
    fn test_highlight_uses_raw_field_text() {
        let corpus = Corpus::new(vec![poem("1", "A，B", "佚名", "唐", &[])]).unwrap();
        let results = rank(&corpus, "a b", &SearchOptions::default(), &config());
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].match_type, MatchType::Exact);
        assert!(results[0].highlight.is_none());
    }

    #[test]
    fn test_results_share_corpus_records() {
        let corpus = sample_corpus();
        let results = rank(&corpus, "李白", &SearchOptions::default(), &config());
        assert!(Arc::ptr_eq(&results[0].poem, corpus.get("1").unwrap()));
    }
}
