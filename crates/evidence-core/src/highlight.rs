//! Highlight application over the rendered text layer
//!
//! The `TextLayer` models the rendered text surface: every segment holds a
//! list of fragments, normally a single plain one. Applying a highlight
//! splits the affected segments into before / highlighted / after
//! fragments; clearing merges them back. The highlighter keeps the last
//! applied range and the segments it touched as explicit state, so a clear
//! never has to inspect the surface to find what is highlighted.

use crate::matcher::{EvidenceMatcher, PreparedBuffer};
use crate::segments::SegmentIndex;
use crate::types::{EvidenceReference, MatchResult, MatchTier, Segment, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A run of segment text, either plain or highlighted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub highlighted: bool,
}

impl Fragment {
    fn plain(text: String) -> Self {
        Self {
            text,
            highlighted: false,
        }
    }
}

/// Rendered content of one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSegment {
    pub id: SegmentId,
    pub fragments: Vec<Fragment>,
}

impl RenderedSegment {
    /// The segment text with fragment boundaries removed
    pub fn plain_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    pub fn is_highlighted(&self) -> bool {
        self.fragments.iter().any(|f| f.highlighted)
    }
}

/// The rendered text surface for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLayer {
    segments: Vec<RenderedSegment>,
    positions: HashMap<SegmentId, usize>,
}

impl TextLayer {
    /// Render segments as single plain fragments, in `order_index` order
    pub fn new(segments: &[Segment]) -> Self {
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|segment| segment.order_index);

        let segments: Vec<RenderedSegment> = ordered
            .into_iter()
            .map(|segment| RenderedSegment {
                id: segment.id,
                fragments: vec![Fragment::plain(segment.text.clone())],
            })
            .collect();
        let positions = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (segment.id, i))
            .collect();

        Self {
            segments,
            positions,
        }
    }

    pub fn segments(&self) -> &[RenderedSegment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&RenderedSegment> {
        self.positions.get(&id).map(|&i| &self.segments[i])
    }

    /// Full visible text of the layer
    pub fn text(&self) -> String {
        self.segments.iter().map(RenderedSegment::plain_text).collect()
    }

    /// Concatenation of all highlighted fragments
    pub fn highlighted_text(&self) -> String {
        self.segments
            .iter()
            .flat_map(|segment| segment.fragments.iter())
            .filter(|fragment| fragment.highlighted)
            .map(|fragment| fragment.text.as_str())
            .collect()
    }

    fn segment_mut(&mut self, id: SegmentId) -> Option<&mut RenderedSegment> {
        let i = *self.positions.get(&id)?;
        self.segments.get_mut(i)
    }

    /// Collapse a segment back to one plain fragment
    fn merge(&mut self, id: SegmentId) {
        if let Some(segment) = self.segment_mut(id) {
            let text = segment.plain_text();
            segment.fragments = vec![Fragment::plain(text)];
        }
    }

    /// Split a segment around `[local_start, local_end)`
    ///
    /// Returns the index of the highlighted fragment.
    fn split(&mut self, id: SegmentId, local_start: usize, local_end: usize) -> Option<usize> {
        let segment = self.segment_mut(id)?;
        let chars: Vec<char> = segment.plain_text().chars().collect();
        let local_end = local_end.min(chars.len());
        if local_start >= local_end {
            return None;
        }

        let before: String = chars[..local_start].iter().collect();
        let matched: String = chars[local_start..local_end].iter().collect();
        let after: String = chars[local_end..].iter().collect();

        let mut fragments = Vec::with_capacity(3);
        if !before.is_empty() {
            fragments.push(Fragment::plain(before));
        }
        let highlighted_at = fragments.len();
        fragments.push(Fragment {
            text: matched,
            highlighted: true,
        });
        if !after.is_empty() {
            fragments.push(Fragment::plain(after));
        }

        segment.fragments = fragments;
        Some(highlighted_at)
    }
}

/// Where to scroll after a highlight has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollTarget {
    pub segment: SegmentId,
    pub fragment: usize,
}

/// The highlight currently present on the text layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveHighlight {
    pub result: MatchResult,
    pub touched: Vec<SegmentId>,
    pub scroll_target: ScrollTarget,
}

/// Sole mutator of the text layer
#[derive(Debug, Default)]
pub struct RangeHighlighter {
    active: Option<ActiveHighlight>,
}

impl RangeHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveHighlight> {
        self.active.as_ref()
    }

    /// Remove the current highlight, restoring the touched segments
    ///
    /// Returns the segments whose content changed; empty when nothing was
    /// highlighted.
    pub fn clear(&mut self, layer: &mut TextLayer) -> Vec<SegmentId> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };

        for id in &active.touched {
            layer.merge(*id);
        }
        tracing::trace!(segments = active.touched.len(), "highlight cleared");
        active.touched
    }

    /// Clear, then highlight `result` on the layer
    ///
    /// Segments in the index but missing from the layer are skipped. Returns
    /// `None` when no segment could be highlighted.
    pub fn apply(
        &mut self,
        layer: &mut TextLayer,
        index: &SegmentIndex,
        result: &MatchResult,
    ) -> Option<&ActiveHighlight> {
        self.clear(layer);

        let mut touched = Vec::new();
        let mut scroll_target = None;

        for range in index.segments_overlapping(result.start, result.end) {
            let local_start = result.start.max(range.start) - range.start;
            let local_end = result.end.min(range.end) - range.start;

            match layer.split(range.id, local_start, local_end) {
                Some(fragment) => {
                    touched.push(range.id);
                    scroll_target.get_or_insert(ScrollTarget {
                        segment: range.id,
                        fragment,
                    });
                }
                None => tracing::debug!(segment = range.id.0, "segment not rendered, skipped"),
            }
        }

        let scroll_target = scroll_target?;
        tracing::debug!(
            start = result.start,
            end = result.end,
            segments = touched.len(),
            "highlight applied"
        );

        self.active = Some(ActiveHighlight {
            result: result.clone(),
            touched,
            scroll_target,
        });
        self.active.as_ref()
    }
}

/// Turn an evidence reference into a range over `buffer`
///
/// Offsets on the reference are authoritative and bypass the matcher; they
/// are clamped to the buffer. Without offsets the quote goes through the
/// matcher cascade.
pub fn resolve_reference(
    reference: &EvidenceReference,
    buffer: &PreparedBuffer,
    matcher: &EvidenceMatcher,
) -> Option<MatchResult> {
    match reference.offsets() {
        Some((start, end)) => {
            let end = end.min(buffer.len());
            MatchResult::from_range(buffer.raw(), start, end, MatchTier::Offsets)
        }
        None => matcher.find(&reference.quote, buffer),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Clearing after any apply restores the layer exactly
        #[test]
        fn clear_after_apply_restores(
            texts in proptest::collection::vec("[a-zé ]{0,8}", 1..10),
            a in 0usize..80,
            b in 0usize..80,
        ) {
            let segments: Vec<Segment> = texts
                .iter()
                .enumerate()
                .map(|(i, text)| Segment::new(i as u32, text.clone(), i))
                .collect();
            let index = SegmentIndex::build(&segments);
            let mut layer = TextLayer::new(&segments);
            let pristine = layer.clone();
            let mut highlighter = RangeHighlighter::new();

            let (start, end) = (a.min(b), a.max(b).min(index.len()));
            if let Some(result) = MatchResult::from_range(index.text(), start, end, MatchTier::Exact) {
                let applied = highlighter.apply(&mut layer, &index, &result).is_some();
                prop_assert!(applied);
                prop_assert_eq!(layer.highlighted_text(), result.matched_text.clone());
                prop_assert_eq!(layer.text(), index.text().to_string());
            }

            highlighter.clear(&mut layer);
            prop_assert_eq!(layer, pristine);
        }
    }
}
