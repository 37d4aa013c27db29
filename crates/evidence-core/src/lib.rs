//! Evidence highlighting and bounding-box projection for document review
//!
//! Given the rendered text segments of a page, this crate locates an
//! extracted evidence quote in the page text, splits the affected segments
//! into highlighted fragments, and projects layout-analysis polygons from
//! page inches onto an overlay canvas.
//!
//! The crate has no browser dependencies; `ViewerSession` is driven by the
//! hosting shell through commands, render-complete signals and clock ticks.

pub mod config;
pub mod error;
pub mod highlight;
pub mod matcher;
pub mod normalize;
pub mod polygon;
pub mod schedule;
pub mod segments;
pub mod session;
pub mod types;

pub use config::{MatcherConfig, OverlayConfig, TimingConfig, ViewerConfig};
pub use error::EvidenceError;
pub use highlight::{
    resolve_reference, ActiveHighlight, Fragment, RangeHighlighter, RenderedSegment, ScrollTarget,
    TextLayer,
};
pub use matcher::{EvidenceMatcher, PreparedBuffer};
pub use polygon::{
    project, BoundingBox, BoxSource, HighlightStyle, OverlayShape, Polygon, PolygonProjector,
};
pub use segments::{SegmentIndex, SegmentRange};
pub use session::{SurfaceUpdate, ViewerSession, ViewerSnapshot};
pub use types::{EvidenceReference, MatchResult, MatchTier, Segment, SegmentId};
