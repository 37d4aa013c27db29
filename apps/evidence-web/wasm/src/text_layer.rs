//! Mirrors the core text layer onto DOM elements
//!
//! Each rendered segment is an element carrying `data-segment-id`. Its
//! children are rebuilt from the segment's fragments: plain fragments become
//! text nodes, highlighted ones become `<mark class="evidence-highlight">`.

use evidence_core::{RenderedSegment, ScrollTarget, SegmentId, SurfaceUpdate, TextLayer};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

/// Attribute linking a DOM element to its segment
pub const SEGMENT_ATTR: &str = "data-segment-id";

/// Class of highlighted fragments
pub const HIGHLIGHT_CLASS: &str = "evidence-highlight";

/// Surface changes with the new content of every changed segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfacePatch {
    pub segments: Vec<RenderedSegment>,
    pub scroll_to: Option<ScrollTarget>,
}

impl SurfacePatch {
    /// Resolve changed segment ids against the layer
    pub fn from_update(update: SurfaceUpdate, layer: Option<&TextLayer>) -> Self {
        let segments = match layer {
            Some(layer) => update
                .changed
                .iter()
                .filter_map(|id| layer.segment(*id).cloned())
                .collect(),
            None => Vec::new(),
        };

        Self {
            segments,
            scroll_to: update.scroll_to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.scroll_to.is_none()
    }
}

/// CSS selector of a segment element
pub fn segment_selector(id: SegmentId) -> String {
    format!("[{}=\"{}\"]", SEGMENT_ATTR, id.0)
}

/// Replace the children of `element` with the segment's fragments
pub fn render_segment(
    document: &Document,
    element: &Element,
    segment: &RenderedSegment,
) -> Result<(), JsValue> {
    element.set_text_content(None);

    for fragment in &segment.fragments {
        if fragment.highlighted {
            let mark = document.create_element("mark")?;
            mark.set_class_name(HIGHLIGHT_CLASS);
            mark.set_text_content(Some(&fragment.text));
            element.append_child(&mark)?;
        } else if !fragment.text.is_empty() {
            let text = document.create_text_node(&fragment.text);
            element.append_child(&text)?;
        }
    }

    Ok(())
}

/// Apply a patch under `container`
///
/// Segments without a matching element are skipped; they belong to a
/// surface that is being re-rendered.
pub fn apply_patch(
    document: &Document,
    container: &Element,
    patch: &SurfacePatch,
) -> Result<(), JsValue> {
    for segment in &patch.segments {
        match container.query_selector(&segment_selector(segment.id))? {
            Some(element) => render_segment(document, &element, segment)?,
            None => web_sys::console::debug_1(
                &format!("segment {} not in DOM, skipped", segment.id.0).into(),
            ),
        }
    }

    if let Some(target) = patch.scroll_to {
        let selector = format!("{} mark.{}", segment_selector(target.segment), HIGHLIGHT_CLASS);
        if let Some(mark) = container.query_selector(&selector)? {
            mark.scroll_into_view();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_core::{MatchResult, MatchTier, RangeHighlighter, Segment, SegmentIndex};

    #[test]
    fn test_segment_selector() {
        assert_eq!(segment_selector(SegmentId(12)), "[data-segment-id=\"12\"]");
    }

    #[test]
    fn test_patch_resolves_changed_segments() {
        let segments = vec![Segment::new(0, "Policy ", 0), Segment::new(1, "PN123", 1)];
        let index = SegmentIndex::build(&segments);
        let mut layer = TextLayer::new(&segments);
        let result = MatchResult::from_range(index.text(), 7, 12, MatchTier::Exact).unwrap();
        RangeHighlighter::new().apply(&mut layer, &index, &result);

        let update = SurfaceUpdate {
            changed: vec![SegmentId(1), SegmentId(9)],
            scroll_to: None,
        };
        let patch = SurfacePatch::from_update(update, Some(&layer));
        assert_eq!(patch.segments.len(), 1);
        assert!(patch.segments[0].is_highlighted());
    }

    #[test]
    fn test_patch_without_layer_keeps_scroll_only() {
        let update = SurfaceUpdate {
            changed: vec![SegmentId(1)],
            scroll_to: Some(ScrollTarget {
                segment: SegmentId(1),
                fragment: 0,
            }),
        };
        let patch = SurfacePatch::from_update(update, None);
        assert!(patch.segments.is_empty());
        assert!(!patch.is_empty());
    }
}
