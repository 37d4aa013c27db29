//! End-to-end highlight scenarios over the public API
//!
//! Run with `RUST_LOG=evidence_core=debug` to see which tier fired.

use evidence_core::{
    BoundingBox, EvidenceMatcher, EvidenceReference, MatchTier, OverlayConfig, PolygonProjector,
    Segment, SegmentId, ViewerSession,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn segments(texts: &[&str]) -> Vec<Segment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Segment::new(i as u32, *text, i))
        .collect()
}

/// Render page 1, set a query and run the clock past the apply delay
fn highlight(texts: &[&str], query: &str) -> ViewerSession {
    init_tracing();
    let mut session = ViewerSession::default();
    session.set_page_count(1);
    session.render_complete(1, &segments(texts), 0);
    session.set_highlight_query(query);
    session.tick(1_000);
    session
}

// ============================================================
// Matcher tiers through the session
// ============================================================

#[test]
fn exact_tier_takes_precedence() {
    let session = highlight(&["Policy ", "PN123", " details"], "PN123");
    let current = session.snapshot().current_match.unwrap();
    assert_eq!(current.tier, MatchTier::Exact);
    assert_eq!(current.matched_text, "PN123");
    assert_eq!(
        session.text_layer().unwrap().highlighted_text(),
        "PN123".to_string()
    );
}

#[test]
fn identifier_reflowed_across_lines() {
    let session = highlight(&["24-02-VH\n", "7053819"], "24-02-VH-7053819");
    let current = session.snapshot().current_match.unwrap();
    assert!(matches!(
        current.tier,
        MatchTier::NoSpace | MatchTier::Alphanumeric
    ));
    assert_eq!(
        session.text_layer().unwrap().highlighted_text(),
        "24-02-VH\n7053819"
    );
}

#[test]
fn numeric_fallback_highlights_digit_run() {
    let session = highlight(&["Policy #: ", "AB-2024-778899"], "Ref#778899A");
    let current = session.snapshot().current_match.unwrap();
    assert_eq!(current.tier, MatchTier::Numeric);
    assert_eq!(current.len(), 6);
    assert_eq!(session.text_layer().unwrap().highlighted_text(), "778899");
}

#[test]
fn two_character_query_never_highlights() {
    let session = highlight(&["ab ab ab"], "ab");
    assert!(session.snapshot().current_match.is_none());
    assert_eq!(session.text_layer().unwrap().highlighted_text(), "");
}

#[test]
fn exact_tier_offsets_follow_collapsed_space() {
    // Three spaces collapse to one, so the hit lands two characters early
    let matcher = EvidenceMatcher::default();
    let hit = matcher.find_in("beta", "alpha   beta").unwrap();
    assert_eq!(hit.tier, MatchTier::Exact);
    assert_eq!((hit.start, hit.end), (6, 10));
    assert_eq!(hit.matched_text, "  be");
}

// ============================================================
// Exact offsets
// ============================================================

#[test]
fn reference_offsets_bypass_matching() {
    init_tracing();
    let mut session = ViewerSession::default();
    session.set_page_count(1);
    session.render_complete(1, &segments(&["Policy ", "PN123 ", "details"]), 0);
    session.jump_to_evidence(EvidenceReference {
        page: 1,
        char_start: Some(5),
        char_end: Some(12),
        quote: "details".to_string(),
        value: None,
    });
    let update = session.tick(300);

    let current = session.snapshot().current_match.unwrap();
    assert_eq!(current.tier, MatchTier::Offsets);
    assert_eq!((current.start, current.end), (5, 12));
    assert_eq!(update.changed, vec![SegmentId(0), SegmentId(1)]);
}

// ============================================================
// Clear / apply
// ============================================================

#[test]
fn clearing_restores_rendered_text() {
    let mut session = highlight(&["Claim ", "number ", "42-A"], "number 42");
    let layer = session.text_layer().unwrap();
    assert_eq!(layer.highlighted_text(), "number 42");

    session.set_highlight_query("");
    let layer = session.text_layer().unwrap();
    for (segment, text) in layer.segments().iter().zip(["Claim ", "number ", "42-A"]) {
        assert_eq!(segment.fragments.len(), 1);
        assert_eq!(segment.plain_text(), text);
        assert!(!segment.is_highlighted());
    }
}

// ============================================================
// Polygon projection
// ============================================================

#[test]
fn malformed_polygons_draw_nothing() {
    let projector = PolygonProjector::new(OverlayConfig::default());
    for len in [7, 9] {
        let bbox = BoundingBox {
            polygon: vec![1.0; len],
            page_width_inches: 8.5,
            page_height_inches: 11.0,
            source: Some("word".to_string()),
        };
        assert!(projector.project_boxes(&[bbox], 850.0, 1100.0).is_empty());
    }
}

#[test]
fn bounding_boxes_from_json() {
    let json = r#"[
        {"polygon":[0,0,8.5,0,8.5,11,0,11],"pageWidthInches":8.5,"pageHeightInches":11,"source":"cell"},
        {"polygon":[1,1,2,1,2,2],"pageWidthInches":8.5,"pageHeightInches":11},
        {"polygon":[1,1,2,1,2,2,1,2],"pageWidthInches":8.5,"pageHeightInches":11,"source":"unknown_tag"}
    ]"#;
    let boxes: Vec<BoundingBox> = serde_json::from_str(json).unwrap();
    let defaults = OverlayConfig::default();

    let mut session = ViewerSession::default();
    session.set_page_count(1);
    session.set_bounding_boxes(1, boxes);
    let shapes = session.overlay_shapes(850.0, 1100.0);

    assert_eq!(shapes.len(), 2);
    assert_eq!(
        shapes[0].points,
        [0.0, 0.0, 850.0, 0.0, 850.0, 1100.0, 0.0, 1100.0]
    );
    assert_eq!(shapes[0].style, defaults.cell);
    assert_eq!(shapes[1].style, defaults.default);
}
