//! Evidence quote location
//!
//! Extraction models quote the document loosely: whitespace is reflowed,
//! hyphens and slashes come and go, markup leaks in. The matcher tries a
//! fixed cascade of progressively looser strategies and returns the first
//! hit, so a stricter tier always wins over a looser one.
//!
//! | Tier          | Search space                                   | Quote requirement     |
//! |---------------|------------------------------------------------|-----------------------|
//! | Exact         | case-folded, whitespace-collapsed buffer       | cleaned quote         |
//! | NoSpace       | buffer without whitespace                      | >= 5 characters       |
//! | Alphanumeric  | buffer reduced to ASCII letters and digits     | >= 4 characters       |
//! | Token         | collapsed buffer, longest quote token first    | tokens >= 3 chars     |
//! | Numeric       | raw buffer, longest digit run first            | runs >= 3 digits      |
//!
//! Exact and Token offsets are computed in collapsed space and applied to
//! the raw buffer unchanged. When the buffer has whitespace runs longer than
//! one character before the hit, the returned range is shifted left of the
//! true span. This imprecision is accepted; NoSpace and Alphanumeric map
//! their hits back to raw offsets exactly.

use crate::config::MatcherConfig;
use crate::normalize::{self, find_chars, Projection};
use crate::types::{MatchResult, MatchTier};

/// A flattened buffer prepared for repeated quote lookups
///
/// All projections are computed once, so each tier is a single scan.
#[derive(Debug, Clone)]
pub struct PreparedBuffer {
    raw: String,
    raw_chars: Vec<char>,
    collapsed: Vec<char>,
    no_space: Projection,
    alphanumeric: Projection,
}

impl PreparedBuffer {
    pub fn new(raw: &str) -> Self {
        let collapsed = normalize::fold_case(&normalize::collapse_whitespace(raw))
            .chars()
            .collect();

        Self {
            raw: raw.to_string(),
            raw_chars: raw.chars().collect(),
            collapsed,
            no_space: Projection::without_whitespace(raw),
            alphanumeric: Projection::alphanumeric(raw),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Buffer length in characters
    pub fn len(&self) -> usize {
        self.raw_chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_chars.is_empty()
    }
}

/// Locates evidence quotes inside a flattened buffer
#[derive(Debug, Clone, Default)]
pub struct EvidenceMatcher {
    config: MatcherConfig,
}

impl EvidenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Convenience wrapper that prepares `buffer` for a single lookup
    pub fn find_in(&self, quote: &str, buffer: &str) -> Option<MatchResult> {
        self.find(quote, &PreparedBuffer::new(buffer))
    }

    /// Run the tier cascade and return the first hit
    pub fn find(&self, quote: &str, buffer: &PreparedBuffer) -> Option<MatchResult> {
        let cleaned = normalize::clean(quote);
        let folded: Vec<char> = normalize::fold_case(&cleaned).chars().collect();

        if folded.len() < self.config.min_quote_chars {
            tracing::debug!(quote = %cleaned, "quote too short to match");
            return None;
        }

        let result = self
            .exact(&folded, buffer)
            .or_else(|| self.no_space(&cleaned, buffer))
            .or_else(|| self.alphanumeric(&cleaned, buffer))
            .or_else(|| self.significant_token(&cleaned, buffer))
            .or_else(|| self.numeric(&cleaned, buffer));

        match &result {
            Some(hit) => tracing::debug!(
                tier = ?hit.tier,
                start = hit.start,
                end = hit.end,
                "evidence located"
            ),
            None => tracing::debug!(quote = %cleaned, "no tier matched"),
        }

        result
    }

    fn exact(&self, folded_quote: &[char], buffer: &PreparedBuffer) -> Option<MatchResult> {
        let start = find_chars(&buffer.collapsed, folded_quote)?;
        MatchResult::from_range(
            &buffer.raw,
            start,
            start + folded_quote.len(),
            MatchTier::Exact,
        )
    }

    fn no_space(&self, cleaned: &str, buffer: &PreparedBuffer) -> Option<MatchResult> {
        let quote = Projection::without_whitespace(cleaned);
        if quote.len() < self.config.min_no_space_chars {
            return None;
        }
        Self::projected(quote.chars(), &buffer.no_space, buffer, MatchTier::NoSpace)
    }

    fn alphanumeric(&self, cleaned: &str, buffer: &PreparedBuffer) -> Option<MatchResult> {
        let quote: Vec<char> = normalize::to_alphanumeric(cleaned).chars().collect();
        if quote.len() < self.config.min_alphanumeric_chars {
            return None;
        }
        Self::projected(&quote, &buffer.alphanumeric, buffer, MatchTier::Alphanumeric)
    }

    fn projected(
        quote: &[char],
        haystack: &Projection,
        buffer: &PreparedBuffer,
        tier: MatchTier,
    ) -> Option<MatchResult> {
        let hit = find_chars(haystack.chars(), quote)?;
        let (start, end) = haystack.raw_range(hit, quote.len())?;
        MatchResult::from_range(&buffer.raw, start, end, tier)
    }

    fn significant_token(&self, cleaned: &str, buffer: &PreparedBuffer) -> Option<MatchResult> {
        let mut tokens: Vec<Vec<char>> = cleaned
            .split(|c: char| !c.is_alphanumeric())
            .map(|token| normalize::fold_case(token).chars().collect::<Vec<char>>())
            .filter(|token| token.len() >= self.config.min_token_chars)
            .collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()));

        tokens.iter().find_map(|token| {
            let start = find_chars(&buffer.collapsed, token)?;
            MatchResult::from_range(&buffer.raw, start, start + token.len(), MatchTier::Token)
        })
    }

    fn numeric(&self, cleaned: &str, buffer: &PreparedBuffer) -> Option<MatchResult> {
        let mut runs = digit_runs(cleaned, self.config.min_digit_run);
        runs.sort_by(|a, b| b.len().cmp(&a.len()));

        runs.iter().find_map(|run| {
            let start = find_chars(&buffer.raw_chars, run)?;
            MatchResult::from_range(&buffer.raw, start, start + run.len(), MatchTier::Numeric)
        })
    }
}

/// Runs of at least `min_len` consecutive ASCII digits, in order of appearance
fn digit_runs(text: &str, min_len: usize) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else {
            if current.len() >= min_len {
                runs.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() >= min_len {
        runs.push(current);
    }

    runs
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any hit is a valid, non-empty range over the raw buffer
        #[test]
        fn hits_are_in_bounds(buffer in "[a-zA-Z0-9 \\n/-]{0,60}", quote in "[a-zA-Z0-9 -]{0,20}") {
            if let Some(hit) = EvidenceMatcher::default().find_in(&quote, &buffer) {
                prop_assert!(hit.start < hit.end);
                prop_assert!(hit.end <= buffer.chars().count());
                let expected: String = buffer.chars().skip(hit.start).take(hit.len()).collect();
                prop_assert_eq!(hit.matched_text, expected);
            }
        }

        /// A verbatim substring without whitespace is always found exactly
        #[test]
        fn verbatim_substring_found(prefix in "[a-z ]{0,20}", needle in "[A-Z0-9]{3,10}", suffix in "[a-z ]{0,20}") {
            let buffer = format!("{}{}{}", prefix, needle, suffix);
            let hit = EvidenceMatcher::default().find_in(&needle, &buffer);
            prop_assert!(hit.is_some());
            prop_assert_eq!(hit.unwrap().tier, MatchTier::Exact);
        }
    }
}
