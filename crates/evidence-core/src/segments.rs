//! Flattening of rendered text segments into a single searchable buffer

use crate::types::{Segment, SegmentId};
use serde::{Deserialize, Serialize};

/// Character range of one segment inside the flattened buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRange {
    pub id: SegmentId,
    pub start: usize,
    pub end: usize,
}

impl SegmentRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether this range intersects `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Concatenated segment text plus the range each segment occupies
///
/// Segments with empty text occupy no range, so range starts are strictly
/// increasing and the ranges tile `[0, len)` exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentIndex {
    text: String,
    char_len: usize,
    ranges: Vec<SegmentRange>,
}

impl SegmentIndex {
    /// Build the index from segments, ordered by `order_index`
    pub fn build(segments: &[Segment]) -> Self {
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|segment| segment.order_index);

        let mut text = String::new();
        let mut ranges = Vec::with_capacity(ordered.len());
        let mut offset = 0;

        for segment in ordered {
            let len = segment.text.chars().count();
            if len == 0 {
                continue;
            }
            text.push_str(&segment.text);
            ranges.push(SegmentRange {
                id: segment.id,
                start: offset,
                end: offset + len,
            });
            offset += len;
        }

        tracing::trace!(segments = ranges.len(), chars = offset, "segment index built");

        Self {
            text,
            char_len: offset,
            ranges,
        }
    }

    /// The flattened buffer
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Buffer length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn ranges(&self) -> &[SegmentRange] {
        &self.ranges
    }

    /// Range occupied by a segment, if it contributed any text
    pub fn range_of(&self, id: SegmentId) -> Option<SegmentRange> {
        self.ranges.iter().find(|range| range.id == id).copied()
    }

    /// All segment ranges intersecting `[start, end)`, in buffer order
    pub fn segments_overlapping(&self, start: usize, end: usize) -> &[SegmentRange] {
        if start >= end {
            return &[];
        }
        let first = self.ranges.partition_point(|range| range.end <= start);
        let last = self.ranges.partition_point(|range| range.start < end);
        if first >= last {
            return &[];
        }
        &self.ranges[first..last]
    }
}
