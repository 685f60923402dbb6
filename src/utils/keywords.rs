//! Keyword list preparation: normalization and request-sized chunking

use std::collections::HashSet;

/// Maximum number of keywords sent to the service in one volume query
pub const CHUNK_SIZE: usize = 700;

/// Trim, lowercase and de-duplicate keywords, dropping empty entries.
///
/// Order is that of first occurrence. Lowercasing is Unicode-aware, so
/// multi-byte text such as `"ÜBER"` becomes `"über"`.
pub fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.clone()))
        .collect()
}

/// Append `extra` to `keywords`, skipping entries already present
pub fn merge_keywords(keywords: &[String], extra: &[String]) -> Vec<String> {
    normalize_keywords(keywords.iter().chain(extra.iter()))
}

/// Split keywords into consecutive chunks of at most `chunk_size` entries.
///
/// Concatenating the chunks gives back the input; only the last chunk may be
/// shorter. An empty input yields no chunks.
pub fn chunk_keywords(keywords: &[String], chunk_size: usize) -> Vec<&[String]> {
    keywords.chunks(chunk_size.max(1)).collect()
}
