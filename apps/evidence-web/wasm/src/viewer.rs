//! Browser command handle for the evidence viewer
//!
//! The viewer shell calls commands on `EvidenceViewer`, reports render
//! completion with the page's text segments, and calls `tick` from its
//! animation frame loop. Observers registered with `subscribe` receive a
//! snapshot object after every state change.

use crate::overlay::{draw_shapes, prepare_canvas, CanvasGeometry};
use crate::text_layer::{apply_patch, SurfacePatch};
use evidence_core::{BoundingBox, EvidenceReference, Segment, ViewerConfig, ViewerSession};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement};

#[wasm_bindgen]
pub struct EvidenceViewer {
    session: ViewerSession,
}

#[wasm_bindgen]
impl EvidenceViewer {
    /// Create a viewer, optionally overriding defaults with a JSON config
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<EvidenceViewer, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) if !json.trim().is_empty() => ViewerConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid viewer config: {}", e)))?,
            _ => ViewerConfig::default(),
        };

        Ok(Self {
            session: ViewerSession::new(config),
        })
    }

    /// Load a document with this many pages, dropping the previous one's state
    #[wasm_bindgen(js_name = setPageCount)]
    pub fn set_page_count(&mut self, page_count: u32) {
        self.session.set_page_count(page_count);
    }

    #[wasm_bindgen(js_name = navigateToPage)]
    pub fn navigate_to_page(&mut self, page: u32) {
        self.session.navigate_to_page(page);
    }

    #[wasm_bindgen(js_name = setHighlightQuery)]
    pub fn set_highlight_query(&mut self, text: &str) {
        self.session.set_highlight_query(text);
    }

    /// Jump to a piece of evidence given as `{ page, charStart?, charEnd?, quote, value? }`
    #[wasm_bindgen(js_name = jumpToEvidence)]
    pub fn jump_to_evidence(&mut self, reference: JsValue) -> Result<(), JsValue> {
        let reference: EvidenceReference = serde_wasm_bindgen::from_value(reference)
            .map_err(|e| JsValue::from_str(&format!("Invalid evidence reference: {}", e)))?;
        self.session.jump_to_evidence(reference);
        Ok(())
    }

    #[wasm_bindgen(js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.session.is_loaded()
    }

    /// Current `{ currentPage, pageCount, query, currentMatch, loaded }`
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.snapshot())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize snapshot: {}", e)))
    }

    /// Call `callback(snapshot)` after every state change
    #[wasm_bindgen]
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        self.session.subscribe(move |snapshot| {
            let value = match serde_wasm_bindgen::to_value(snapshot) {
                Ok(value) => value,
                Err(e) => {
                    web_sys::console::warn_1(&format!("snapshot not delivered: {}", e).into());
                    return;
                }
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                web_sys::console::warn_1(&e);
            }
        });
    }

    /// Report that `page` finished rendering with these `{ id, text, orderIndex }` segments
    #[wasm_bindgen(js_name = renderComplete)]
    pub fn render_complete(
        &mut self,
        page: u32,
        segments: JsValue,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let segments: Vec<Segment> = serde_wasm_bindgen::from_value(segments)
            .map_err(|e| JsValue::from_str(&format!("Invalid segments: {}", e)))?;
        self.session.render_complete(page, &segments, clock(now_ms));
        Ok(())
    }

    /// Run due actions; mirror the changes under `container` when given
    ///
    /// Returns the applied patch so shells with their own text layer can
    /// render it themselves.
    #[wasm_bindgen]
    pub fn tick(&mut self, now_ms: f64, container: Option<Element>) -> Result<JsValue, JsValue> {
        let update = self.session.tick(clock(now_ms));
        let patch = SurfacePatch::from_update(update, self.session.text_layer());

        if let Some(container) = container {
            if !patch.is_empty() {
                match web_sys::window().and_then(|w| w.document()) {
                    Some(document) => apply_patch(&document, &container, &patch)?,
                    None => web_sys::console::debug_1(&"no document, patch not applied".into()),
                }
            }
        }

        serde_wasm_bindgen::to_value(&patch)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize patch: {}", e)))
    }

    /// Replace the bounding boxes of `page` with
    /// `[{ polygon, pageWidthInches, pageHeightInches, source? }]`
    #[wasm_bindgen(js_name = setBoundingBoxes)]
    pub fn set_bounding_boxes(&mut self, page: u32, boxes: JsValue) -> Result<(), JsValue> {
        let boxes: Vec<BoundingBox> = serde_wasm_bindgen::from_value(boxes)
            .map_err(|e| JsValue::from_str(&format!("Invalid bounding boxes: {}", e)))?;
        self.session.set_bounding_boxes(page, boxes);
        Ok(())
    }

    /// Redraw the current page's boxes; returns the number of shapes drawn
    ///
    /// A canvas without a 2d context or with zero size draws nothing.
    #[wasm_bindgen(js_name = drawOverlay)]
    pub fn draw_overlay(
        &self,
        canvas: &HtmlCanvasElement,
        css_width: f64,
        css_height: f64,
        device_pixel_ratio: f64,
    ) -> Result<u32, JsValue> {
        let geometry = CanvasGeometry::new(css_width, css_height, device_pixel_ratio);
        let Some(context) = prepare_canvas(canvas, &geometry)? else {
            return Ok(0);
        };

        let (width, height) = geometry.physical_size();
        let shapes = self.session.overlay_shapes(width as f64, height as f64);
        draw_shapes(&context, &shapes, geometry.ratio());
        Ok(shapes.len() as u32)
    }
}

/// Host timestamps arrive as `performance.now()` doubles
fn clock(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_creation() {
        let viewer = EvidenceViewer::new(None).unwrap();
        assert!(!viewer.is_loaded());
    }

    #[test]
    fn test_viewer_loaded_after_page_count() {
        let mut viewer = EvidenceViewer::new(Some(String::new())).unwrap();
        viewer.set_page_count(4);
        viewer.navigate_to_page(3);
        assert!(viewer.is_loaded());
        assert_eq!(viewer.session.current_page(), 3);
    }

    #[test]
    fn test_clock_conversion() {
        assert_eq!(clock(1234.9), 1234);
        assert_eq!(clock(-5.0), 0);
        assert_eq!(clock(f64::NAN), 0);
    }
}
