//! Bounding box overlay drawing
//!
//! Draws projected polygons on the overlay canvas stacked above the page
//! canvas. The canvas backing store is sized in physical pixels so strokes
//! stay sharp on high-density displays; polygons are projected straight
//! into that physical pixel space.

use evidence_core::OverlayShape;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Size of the overlay as laid out by the page, plus the display density
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    /// Width in CSS pixels
    pub css_width: f64,
    /// Height in CSS pixels
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl CanvasGeometry {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }

    /// Effective ratio; non-positive or non-finite ratios count as 1
    pub fn ratio(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Backing store size in physical pixels
    pub fn physical_size(&self) -> (u32, u32) {
        let ratio = self.ratio();
        (
            (self.css_width * ratio).round().max(0.0) as u32,
            (self.css_height * ratio).round().max(0.0) as u32,
        )
    }

    /// Whether there is anything to draw on
    pub fn is_drawable(&self) -> bool {
        let (width, height) = self.physical_size();
        width > 0 && height > 0
    }
}

/// Resize the canvas for `geometry` and return its 2d context
///
/// Returns `Ok(None)` when the canvas has no 2d context or zero area; the
/// caller skips drawing for this cycle.
pub fn prepare_canvas(
    canvas: &HtmlCanvasElement,
    geometry: &CanvasGeometry,
) -> Result<Option<CanvasRenderingContext2d>, JsValue> {
    if !geometry.is_drawable() {
        return Ok(None);
    }

    let (width, height) = geometry.physical_size();
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }

    let context = match canvas.get_context("2d")? {
        Some(context) => context.dyn_into::<CanvasRenderingContext2d>()?,
        None => return Ok(None),
    };
    context.clear_rect(0.0, 0.0, width as f64, height as f64);
    Ok(Some(context))
}

/// Stroke and fill every shape; coordinates are physical pixels
#[allow(deprecated)]
pub fn draw_shapes(context: &CanvasRenderingContext2d, shapes: &[OverlayShape], ratio: f64) {
    for shape in shapes {
        let p = &shape.points;
        context.begin_path();
        context.move_to(p[0], p[1]);
        context.line_to(p[2], p[3]);
        context.line_to(p[4], p[5]);
        context.line_to(p[6], p[7]);
        context.close_path();

        context.set_fill_style(&JsValue::from_str(&shape.style.fill));
        context.fill();
        context.set_stroke_style(&JsValue::from_str(&shape.style.stroke));
        context.set_line_width(shape.style.line_width * ratio);
        context.stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_size_scales_by_ratio() {
        let geometry = CanvasGeometry::new(612.0, 792.0, 2.0);
        assert_eq!(geometry.physical_size(), (1224, 1584));
    }

    #[test]
    fn test_invalid_ratio_falls_back_to_one() {
        assert_eq!(CanvasGeometry::new(100.0, 50.0, 0.0).physical_size(), (100, 50));
        assert_eq!(
            CanvasGeometry::new(100.0, 50.0, f64::NAN).physical_size(),
            (100, 50)
        );
    }

    #[test]
    fn test_zero_area_is_not_drawable() {
        assert!(!CanvasGeometry::new(0.0, 792.0, 1.0).is_drawable());
        assert!(!CanvasGeometry::new(-5.0, 792.0, 1.0).is_drawable());
        assert!(CanvasGeometry::new(1.0, 1.0, 1.0).is_drawable());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Physical size never shrinks below the CSS size for ratios >= 1
        #[test]
        fn physical_at_least_css(
            width in 1.0f64..4000.0,
            height in 1.0f64..4000.0,
            ratio in 1.0f64..4.0,
        ) {
            let (w, h) = CanvasGeometry::new(width, height, ratio).physical_size();
            prop_assert!(w as f64 >= width.round());
            prop_assert!(h as f64 >= height.round());
        }
    }
}
