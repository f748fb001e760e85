//! Aggregation queries over the corpus
//!
//! Frequency distributions of tags, authors and categories, corpus totals
//! and title/author autocomplete.

use std::collections::{HashMap, HashSet};

use super::normalize::normalize_query;
use crate::corpus::Corpus;
use crate::types::{AuthorCount, CategoryCount, TagCount};

/// Maximum number of autocomplete suggestions
pub const MAX_SUGGESTIONS: usize = 5;

/// Minimum normalized query length (in characters) for suggestions
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 2;

/// Count occurrences, most frequent first; ties keep first-seen order
fn count_desc<'a, I>(values: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

/// Get tag distribution
pub fn tag_distribution(corpus: &Corpus, limit: usize) -> Vec<TagCount> {
    count_desc(
        corpus
            .iter()
            .flat_map(|poem| poem.tags().iter().map(String::as_str)),
        limit,
    )
    .into_iter()
    .map(|(tag, count)| TagCount { tag, count })
    .collect()
}

/// Get author distribution
pub fn author_distribution(corpus: &Corpus, limit: usize) -> Vec<AuthorCount> {
    count_desc(corpus.iter().map(|poem| poem.author.as_str()), limit)
        .into_iter()
        .map(|(author, count)| AuthorCount { author, count })
        .collect()
}

/// Get category distribution; poems without a category are skipped
pub fn category_distribution(corpus: &Corpus, limit: usize) -> Vec<CategoryCount> {
    count_desc(
        corpus.iter().filter_map(|poem| poem.category.as_deref()),
        limit,
    )
    .into_iter()
    .map(|(category, count)| CategoryCount { category, count })
    .collect()
}

/// Totals across the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusTotals {
    pub poems: usize,
    pub authors: usize,
    pub tags: usize,
}

pub fn corpus_totals(corpus: &Corpus) -> CorpusTotals {
    let authors: HashSet<&str> = corpus.iter().map(|p| p.author.as_str()).collect();
    let tags: HashSet<&str> = corpus
        .iter()
        .flat_map(|p| p.tags().iter().map(String::as_str))
        .collect();

    CorpusTotals {
        poems: corpus.len(),
        authors: authors.len(),
        tags: tags.len(),
    }
}

/// Titles and authors containing the query, deduplicated, in corpus order
pub fn suggest(corpus: &Corpus, query: &str) -> Vec<String> {
    let normalized = normalize_query(query);
    if normalized.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut suggestions: Vec<String> = Vec::new();

    for poem in corpus.iter() {
        for candidate in [poem.title.as_str(), poem.author.as_str()] {
            if candidate.to_lowercase().contains(&normalized) && seen.insert(candidate) {
                suggestions.push(candidate.to_string());
                if suggestions.len() >= MAX_SUGGESTIONS {
                    return suggestions;
                }
            }
        }
    }

    suggestions
}
