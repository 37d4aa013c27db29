//! Projection of layout-analysis polygons onto the overlay canvas
//!
//! Polygons arrive as 4 corners in page inches with a top-left origin, the
//! same orientation as the canvas, so projection is a per-axis scale with
//! no flip, offset or clamping.

use crate::config::OverlayConfig;
use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};

/// A validated 4-corner polygon in page inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    /// x0, y0, x1, y1, x2, y2, x3, y3
    pub points: [f64; 8],
    pub page_width_inches: f64,
    pub page_height_inches: f64,
}

impl Polygon {
    /// Build a polygon from raw numbers
    ///
    /// # Errors
    /// Returns an error unless `points` has exactly 8 numbers and the page
    /// size is positive and finite.
    pub fn new(
        points: &[f64],
        page_width_inches: f64,
        page_height_inches: f64,
    ) -> Result<Self, EvidenceError> {
        let points: [f64; 8] = points
            .try_into()
            .map_err(|_| EvidenceError::MalformedPolygon(points.len()))?;

        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(page_width_inches) || !valid(page_height_inches) {
            return Err(EvidenceError::InvalidPageSize {
                width: page_width_inches,
                height: page_height_inches,
            });
        }

        Ok(Self {
            points,
            page_width_inches,
            page_height_inches,
        })
    }
}

/// Scale a polygon's corners from page inches to canvas pixels
pub fn project(polygon: &Polygon, canvas_width_px: f64, canvas_height_px: f64) -> [f64; 8] {
    let scale_x = canvas_width_px / polygon.page_width_inches;
    let scale_y = canvas_height_px / polygon.page_height_inches;

    let mut projected = polygon.points;
    for corner in projected.chunks_exact_mut(2) {
        corner[0] *= scale_x;
        corner[1] *= scale_y;
    }
    projected
}

/// Which layout-analysis pass produced a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxSource {
    Word,
    Line,
    Merged,
    Cell,
}

impl BoxSource {
    /// Parse a source tag; tags outside the closed set yield `None`
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "word" => Some(Self::Word),
            "line" => Some(Self::Line),
            "merged" => Some(Self::Merged),
            "cell" => Some(Self::Cell),
            _ => None,
        }
    }
}

/// Fill and stroke for one kind of bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyle {
    /// CSS fill colour
    pub fill: String,
    /// CSS stroke colour
    pub stroke: String,
    /// Stroke width in CSS pixels
    #[serde(default = "default_line_width")]
    pub line_width: f64,
}

fn default_line_width() -> f64 {
    1.0
}

impl HighlightStyle {
    pub fn new(fill: &str, stroke: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            line_width: default_line_width(),
        }
    }
}

impl Default for HighlightStyle {
    fn default() -> Self {
        OverlayConfig::default().default
    }
}

/// A bounding box record as delivered by the layout collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub polygon: Vec<f64>,
    pub page_width_inches: f64,
    pub page_height_inches: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl BoundingBox {
    pub fn polygon(&self) -> Result<Polygon, EvidenceError> {
        Polygon::new(
            &self.polygon,
            self.page_width_inches,
            self.page_height_inches,
        )
    }
}

/// A projected polygon ready to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayShape {
    pub points: [f64; 8],
    pub style: HighlightStyle,
}

/// Projects bounding boxes and resolves their styles
#[derive(Debug, Clone, Default)]
pub struct PolygonProjector {
    styles: OverlayConfig,
}

impl PolygonProjector {
    pub fn new(styles: OverlayConfig) -> Self {
        Self { styles }
    }

    /// Style for a source tag; untagged or unknown tags get the default
    pub fn style_for(&self, source: Option<&str>) -> &HighlightStyle {
        match source.and_then(BoxSource::parse) {
            Some(BoxSource::Word) => &self.styles.word,
            Some(BoxSource::Line) => &self.styles.line,
            Some(BoxSource::Merged) => &self.styles.merged,
            Some(BoxSource::Cell) => &self.styles.cell,
            None => &self.styles.default,
        }
    }

    /// Project every well-formed box, silently skipping the rest
    pub fn project_boxes(
        &self,
        boxes: &[BoundingBox],
        canvas_width_px: f64,
        canvas_height_px: f64,
    ) -> Vec<OverlayShape> {
        boxes
            .iter()
            .filter_map(|bbox| match bbox.polygon() {
                Ok(polygon) => Some(OverlayShape {
                    points: project(&polygon, canvas_width_px, canvas_height_px),
                    style: self.style_for(bbox.source.as_deref()).clone(),
                }),
                Err(e) => {
                    tracing::debug!("skipping bounding box: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(points: Vec<f64>, source: Option<&str>) -> BoundingBox {
        BoundingBox {
            polygon: points,
            page_width_inches: 8.5,
            page_height_inches: 11.0,
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_project_full_letter_page() {
        let polygon = Polygon::new(&[0.0, 0.0, 8.5, 0.0, 8.5, 11.0, 0.0, 11.0], 8.5, 11.0).unwrap();
        let projected = project(&polygon, 850.0, 1100.0);
        assert_eq!(
            projected,
            [0.0, 0.0, 850.0, 0.0, 850.0, 1100.0, 0.0, 1100.0]
        );
    }

    #[test]
    fn test_project_axes_scale_independently() {
        let polygon = Polygon::new(&[1.0, 1.0, 2.0, 1.0, 2.0, 2.0, 1.0, 2.0], 10.0, 10.0).unwrap();
        let projected = project(&polygon, 1000.0, 500.0);
        assert_eq!(projected, [100.0, 50.0, 200.0, 50.0, 200.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_polygon_arity_rejected() {
        assert!(matches!(
            Polygon::new(&[0.0; 7], 8.5, 11.0),
            Err(EvidenceError::MalformedPolygon(7))
        ));
        assert!(matches!(
            Polygon::new(&[0.0; 9], 8.5, 11.0),
            Err(EvidenceError::MalformedPolygon(9))
        ));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            Polygon::new(&[0.0; 8], 0.0, 11.0),
            Err(EvidenceError::InvalidPageSize { .. })
        ));
    }

    #[test]
    fn test_malformed_boxes_are_skipped() {
        let projector = PolygonProjector::default();
        let boxes = vec![
            letter(vec![0.0; 7], None),
            letter(vec![0.0; 9], Some("word")),
            letter(vec![], Some("cell")),
        ];
        assert!(projector.project_boxes(&boxes, 850.0, 1100.0).is_empty());
    }

    #[test]
    fn test_project_boxes_keeps_valid_ones() {
        let projector = PolygonProjector::default();
        let boxes = vec![
            letter(vec![0.0; 7], None),
            letter(vec![1.0, 1.0, 2.0, 1.0, 2.0, 2.0, 1.0, 2.0], Some("cell")),
        ];
        let shapes = projector.project_boxes(&boxes, 850.0, 1100.0);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].points[0], 100.0);
        assert_eq!(shapes[0].style, OverlayConfig::default().cell);
    }

    #[test]
    fn test_style_for() {
        let projector = PolygonProjector::default();
        let defaults = OverlayConfig::default();
        assert_eq!(projector.style_for(Some("cell")), &defaults.cell);
        assert_eq!(projector.style_for(Some("word")), &defaults.word);
        assert_eq!(projector.style_for(Some("line")), &defaults.line);
        assert_eq!(projector.style_for(Some("merged")), &defaults.merged);
        assert_eq!(projector.style_for(Some("unknown_tag")), &defaults.default);
        assert_eq!(projector.style_for(None), &defaults.default);
    }

    #[test]
    fn test_bounding_box_deserializes() {
        let json = r#"{"polygon":[0,0,1,0,1,1,0,1],"pageWidthInches":8.5,"pageHeightInches":11,"source":"line"}"#;
        let bbox: BoundingBox = serde_json::from_str(json).unwrap();
        assert_eq!(bbox.source.as_deref(), Some("line"));
        assert!(bbox.polygon().is_ok());
    }
}
