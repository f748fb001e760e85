//! Core types for poetry-search

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for a poem within a corpus
pub type PoemId = String;

/// A poem record from the static corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poem {
    /// Unique identifier
    pub id: PoemId,
    /// Title of the poem
    pub title: String,
    /// Content lines, in rendering order
    #[serde(default)]
    pub content: Vec<String>,
    /// Author name
    pub author: String,
    /// Dynasty (e.g. "唐", "宋")
    pub dynasty: String,
    /// Tags for categorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Where the poem was collected from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Category (e.g. "五言绝句")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Poem {
    /// Tags as a slice, empty when the record carries none
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    /// Whether any of the poem's tags appears in `wanted`
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags().iter().any(|tag| wanted.contains(tag))
    }
}

/// How strongly a result matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Some field matched the whole query exactly
    Exact,
    /// The title matched, but not exactly
    Partial,
    /// Only approximate or non-title substring matches
    #[default]
    Fuzzy,
    /// Result supplied by a remote provider
    Network,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Partial => "partial",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Network => "network",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(MatchType::Exact),
            "partial" => Ok(MatchType::Partial),
            "fuzzy" => Ok(MatchType::Fuzzy),
            "network" => Ok(MatchType::Network),
            _ => Err(format!("Unknown match type: {}", s)),
        }
    }
}

const TITLE_LABEL: &str = "标题";
const AUTHOR_LABEL: &str = "作者";
const CONTENT_LABEL: &str = "内容";
const TAG_LABEL_PREFIX: &str = "标签: ";

/// A field of a poem that contributed to a match
///
/// Serialized as its display label (`标题`, `作者`, `内容`, `标签: <tag>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MatchedField {
    Title,
    Author,
    Content,
    Tag(String),
}

impl MatchedField {
    pub fn label(&self) -> String {
        match self {
            MatchedField::Title => TITLE_LABEL.to_string(),
            MatchedField::Author => AUTHOR_LABEL.to_string(),
            MatchedField::Content => CONTENT_LABEL.to_string(),
            MatchedField::Tag(tag) => format!("{}{}", TAG_LABEL_PREFIX, tag),
        }
    }
}

impl std::fmt::Display for MatchedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<MatchedField> for String {
    fn from(field: MatchedField) -> Self {
        field.label()
    }
}

impl TryFrom<String> for MatchedField {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        match label.as_str() {
            TITLE_LABEL => Ok(MatchedField::Title),
            AUTHOR_LABEL => Ok(MatchedField::Author),
            CONTENT_LABEL => Ok(MatchedField::Content),
            other => other
                .strip_prefix(TAG_LABEL_PREFIX)
                .map(|tag| MatchedField::Tag(tag.to_string()))
                .ok_or_else(|| format!("Unknown matched field label: {}", other)),
        }
    }
}

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// The matched poem, shared with the corpus
    pub poem: Arc<Poem>,
    /// Relevance score in [0, 1]
    pub score: f32,
    /// How the result matched
    pub match_type: MatchType,
    /// Matched snippets joined with " | "
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    /// Fields that matched, deduplicated in evaluation order
    #[serde(default)]
    pub matched_fields: Vec<MatchedField>,
}

/// Requested result ordering
///
/// The corpus carries no dates or popularity counts, so every variant
/// currently orders by relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
    Popularity,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "date" => Ok(SortBy::Date),
            "popularity" => Ok(SortBy::Popularity),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Options for a search call
///
/// Unset ranking parameters fall back to the service's
/// [`SearchConfig`](crate::search::SearchConfig) defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Enable approximate matching (default: true)
    pub fuzzy: Option<bool>,
    /// Maximum number of results (default: 20)
    pub limit: Option<usize>,
    /// Ask for remote results as well; see
    /// [`PoetrySearchService::search_with_network`](crate::PoetrySearchService::search_with_network)
    #[serde(default)]
    pub include_network: bool,
    /// Minimum score to include in results (default: 0.3)
    pub min_score: Option<f32>,
    /// Only poems of this dynasty
    pub dynasty: Option<String>,
    /// Only poems of this category
    pub category: Option<String>,
    /// Only poems carrying at least one of these tags
    pub tags: Option<Vec<String>>,
    /// Only poems by this author
    pub author: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl SearchOptions {
    pub fn with_dynasty(mut self, dynasty: impl Into<String>) -> Self {
        self.dynasty = Some(dynasty.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }
}

/// Tag frequency across the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Author frequency across the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: usize,
}

/// Category frequency across the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Corpus-wide statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_poetry: usize,
    pub total_authors: usize,
    pub total_tags: usize,
    pub cache_size: usize,
}
