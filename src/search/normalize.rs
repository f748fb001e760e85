//! Query normalization

/// Full-width punctuation treated as word separators
const SEPARATORS: &[char] = &[
    '，', '。', '？', '！', '、', '；', '：', '"', '\'', '「', '」', '（', '）', '【', '】', '“',
    '”', '‘', '’',
];

/// Lowercase, strip separator punctuation and collapse whitespace
///
/// Total and idempotent; empty or punctuation-only input yields `""`.
pub fn normalize_query(query: &str) -> String {
    let replaced: String = query
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// History form of a query: trimmed and lowercased only
pub fn normalize_history_entry(query: &str) -> String {
    query.trim().to_lowercase()
}
