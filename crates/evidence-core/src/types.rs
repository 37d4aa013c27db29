//! Records shared by the matcher, highlighter and viewer session

use serde::{Deserialize, Serialize};

/// Identifier of a rendered text segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

/// An ordered unit of rendered text (one line or word run of a page)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: SegmentId,
    pub text: String,
    pub order_index: usize,
}

impl Segment {
    pub fn new(id: u32, text: impl Into<String>, order_index: usize) -> Self {
        Self {
            id: SegmentId(id),
            text: text.into(),
            order_index,
        }
    }
}

/// Which matching strategy produced a highlight range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Offsets supplied verbatim by the evidence reference
    Offsets,
    Exact,
    NoSpace,
    Alphanumeric,
    Token,
    Numeric,
}

/// A character range in the flattened buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// First character of the range
    pub start: usize,
    /// One past the last character of the range
    pub end: usize,
    pub tier: MatchTier,
    /// Raw buffer characters covered by `start..end`
    pub matched_text: String,
}

impl MatchResult {
    /// Build a result from a character range over `buffer`
    ///
    /// Returns `None` unless `start < end <= len(buffer)`.
    pub fn from_range(buffer: &str, start: usize, end: usize, tier: MatchTier) -> Option<Self> {
        let len = buffer.chars().count();
        if start >= end || end > len {
            return None;
        }

        let matched_text = buffer.chars().skip(start).take(end - start).collect();
        Some(Self {
            start,
            end,
            tier,
            matched_text,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A highlight request from the extraction results ("jump to evidence")
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceReference {
    /// Page number (1-indexed)
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_end: Option<usize>,
    #[serde(default)]
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EvidenceReference {
    pub fn from_quote(page: u32, quote: impl Into<String>) -> Self {
        Self {
            page,
            quote: quote.into(),
            ..Default::default()
        }
    }

    /// The authoritative offsets, when both are present and non-empty
    pub fn offsets(&self) -> Option<(usize, usize)> {
        match (self.char_start, self.char_end) {
            (Some(start), Some(end)) if end > start => Some((start, end)),
            _ => None,
        }
    }
}
