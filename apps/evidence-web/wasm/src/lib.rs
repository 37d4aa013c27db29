use evidence_core::{EvidenceMatcher, MatcherConfig};
use wasm_bindgen::prelude::*;

// Export modules
pub mod overlay;
pub mod text_layer;
pub mod viewer;

// Re-export commonly used items
pub use overlay::{draw_shapes, prepare_canvas, CanvasGeometry};
pub use text_layer::{apply_patch, render_segment, SurfacePatch, HIGHLIGHT_CLASS, SEGMENT_ATTR};
pub use viewer::EvidenceViewer;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Evidence viewer WASM initialized".into());
}

/// Locate `quote` in `text` without a viewer, returning the match as JSON
///
/// Returns `null` when no tier matches. Useful for the labels form, which
/// shows whether a value's evidence can be found before the user jumps to it.
#[wasm_bindgen(js_name = findEvidence)]
pub fn find_evidence(quote: &str, text: &str) -> Result<String, JsValue> {
    let result = EvidenceMatcher::new(MatcherConfig::default()).find_in(quote, text);
    serde_json::to_string(&result)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize match: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_evidence_json() {
        let json = find_evidence("PN123", "Policy PN123 details").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tier"], "exact");
        assert_eq!(value["start"], 7);
        assert_eq!(value["matchedText"], "PN123");
    }

    #[test]
    fn test_find_evidence_no_match_is_null() {
        assert_eq!(find_evidence("ab", "ab").unwrap(), "null");
    }
}
