//! Field scoring with approximate matching
//!
//! The fuzzy fallback is a positional character comparison, not an edit
//! distance: it rewards strings that agree character-for-character from the
//! start. That is cheap, deterministic and good enough for short CJK fields
//! such as titles and author names.

use super::normalize::normalize_query;

/// Score for a field equal to the query
pub const EXACT_SCORE: f32 = 1.0;

/// Score for a field containing the query
pub const SUBSTRING_SCORE: f32 = 0.85;

/// Similarity when one string contains the other
const CONTAINMENT_SIMILARITY: f32 = 0.9;

/// Scale applied to the positional match ratio
const POSITIONAL_WEIGHT: f32 = 0.8;

/// Score one field value against an already-normalized query
///
/// The field is normalized the same way as the query before comparison, so
/// `field_score(f, &normalize_query(f), true) == 1.0` for any nonempty `f`.
/// A field or query that normalizes to nothing never matches anything else.
pub fn field_score(field: &str, normalized_query: &str, fuzzy: bool) -> f32 {
    if field.is_empty() {
        return 0.0;
    }

    let normalized_field = normalize_query(field);
    if normalized_field == normalized_query {
        return EXACT_SCORE;
    }
    if normalized_field.is_empty() || normalized_query.is_empty() {
        return 0.0;
    }
    if normalized_field.contains(normalized_query) {
        return SUBSTRING_SCORE;
    }
    if fuzzy {
        return similarity(normalized_query, &normalized_field);
    }
    0.0
}

/// Approximate similarity of two strings in [0, 1]
///
/// 1.0 when equal, 0.9 when one contains the other, otherwise the share of
/// positions holding the same character, scaled by 0.8.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return CONTAINMENT_SIMILARITY;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }

    let max_len = a_chars.len().max(b_chars.len());
    let matches = a_chars
        .iter()
        .zip(b_chars.iter())
        .filter(|(x, y)| x == y)
        .count();

    (matches as f32 / max_len as f32) * POSITIONAL_WEIGHT
}
