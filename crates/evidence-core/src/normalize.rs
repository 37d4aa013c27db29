//! Text normalization for evidence matching
//!
//! Every function here operates on characters, never bytes, so offsets
//! computed on a projection can be mapped back to the raw buffer.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Strip tags, unescape basic entities, collapse whitespace and trim
pub fn clean(text: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(text, "");
    let unescaped = without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    collapse_whitespace(&unescaped).trim().to_string()
}

/// Keep only ASCII letters and digits, lower-cased
pub fn to_alphanumeric(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Replace every whitespace run with a single space (no trimming)
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Lower-case one character without changing the character count
///
/// Characters whose lower-case form expands to several characters are
/// kept as they are.
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Case-fold a string character by character
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// A compacted view of a raw buffer that remembers where each kept
/// character came from
#[derive(Debug, Clone)]
pub struct Projection {
    compact: Vec<char>,
    raw_index: Vec<usize>,
}

impl Projection {
    /// Keep the (case-folded) characters of `raw` accepted by `keep`
    pub fn new(raw: &str, keep: impl Fn(char) -> bool) -> Self {
        let mut compact = Vec::new();
        let mut raw_index = Vec::new();

        for (index, c) in raw.chars().enumerate() {
            if keep(c) {
                compact.push(fold_char(c));
                raw_index.push(index);
            }
        }

        Self { compact, raw_index }
    }

    /// Projection that drops whitespace
    pub fn without_whitespace(raw: &str) -> Self {
        Self::new(raw, |c| !c.is_whitespace())
    }

    /// Projection that keeps ASCII letters and digits only
    pub fn alphanumeric(raw: &str) -> Self {
        Self::new(raw, |c| c.is_ascii_alphanumeric())
    }

    pub fn chars(&self) -> &[char] {
        &self.compact
    }

    pub fn len(&self) -> usize {
        self.compact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compact.is_empty()
    }

    /// Map a compacted range `[start, start + len)` back to raw offsets
    ///
    /// The raw range starts at the first kept character and ends just after
    /// the last one, so skipped characters inside the match are included.
    pub fn raw_range(&self, start: usize, len: usize) -> Option<(usize, usize)> {
        if len == 0 {
            return None;
        }
        let first = *self.raw_index.get(start)?;
        let last = *self.raw_index.get(start + len - 1)?;
        Some((first, last + 1))
    }
}

/// Find the first character index where `needle` occurs in `haystack`
pub fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
