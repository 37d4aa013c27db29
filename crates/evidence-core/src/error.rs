use thiserror::Error;

/// Errors raised by the fallible constructors of this crate.
///
/// The highlight and overlay paths never surface these to the reviewer;
/// they are logged and the offending item is skipped.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Polygon must have exactly 8 numbers, got {0}")]
    MalformedPolygon(usize),

    #[error("Invalid page size: {width} x {height} inches")]
    InvalidPageSize { width: f64, height: f64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
