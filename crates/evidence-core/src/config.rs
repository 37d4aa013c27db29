//! Configuration for the evidence viewer
//!
//! Every section defaults to the values the viewer ships with, so a host
//! only needs to supply the keys it wants to override:
//!
//! ```
//! use evidence_core::config::ViewerConfig;
//!
//! let config = ViewerConfig::from_json(r#"{"timing": {"apply_delay_ms": 500}}"#).unwrap();
//! assert_eq!(config.timing.apply_delay_ms, 500);
//! assert_eq!(config.timing.scroll_delay_ms, 100);
//! ```

use crate::error::EvidenceError;
use crate::polygon::HighlightStyle;
use serde::{Deserialize, Serialize};

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Evidence matching thresholds
    pub matcher: MatcherConfig,
    /// Sequencing delays between render, highlight and scroll
    pub timing: TimingConfig,
    /// Bounding box styles
    pub overlay: OverlayConfig,
}

impl ViewerConfig {
    /// Parse configuration from a JSON string and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a threshold is zero.
    pub fn from_json(json: &str) -> Result<Self, EvidenceError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all thresholds are usable
    pub fn validate(&self) -> Result<(), EvidenceError> {
        let m = &self.matcher;
        let thresholds = [
            ("min_quote_chars", m.min_quote_chars),
            ("min_no_space_chars", m.min_no_space_chars),
            ("min_alphanumeric_chars", m.min_alphanumeric_chars),
            ("min_token_chars", m.min_token_chars),
            ("min_digit_run", m.min_digit_run),
        ];

        for (name, value) in thresholds {
            if value == 0 {
                return Err(EvidenceError::Config(format!("{} must be at least 1", name)));
            }
        }

        Ok(())
    }
}

/// Minimum lengths used by the matcher tiers (all in characters)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Cleaned quotes shorter than this are rejected outright
    pub min_quote_chars: usize,
    /// Whitespace-free quote length required by the no-space tier
    pub min_no_space_chars: usize,
    /// Alphanumeric quote length required by the alphanumeric tier
    pub min_alphanumeric_chars: usize,
    /// Shortest token considered by the significant-token tier
    pub min_token_chars: usize,
    /// Shortest digit run considered by the numeric tier
    pub min_digit_run: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_quote_chars: 3,
            min_no_space_chars: 5,
            min_alphanumeric_chars: 4,
            min_token_chars: 3,
            min_digit_run: 3,
        }
    }
}

/// Sequencing delays, in milliseconds of host time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between a render-complete signal and applying the highlight
    pub apply_delay_ms: u64,
    /// Delay between applying the highlight and scrolling it into view
    pub scroll_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            apply_delay_ms: 300,
            scroll_delay_ms: 100,
        }
    }
}

/// Styles for each bounding box source, plus the fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub word: HighlightStyle,
    pub line: HighlightStyle,
    pub merged: HighlightStyle,
    pub cell: HighlightStyle,
    pub default: HighlightStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            word: HighlightStyle::new("rgba(59, 130, 246, 0.15)", "rgba(59, 130, 246, 0.8)"),
            line: HighlightStyle::new("rgba(16, 185, 129, 0.12)", "rgba(16, 185, 129, 0.8)"),
            merged: HighlightStyle::new("rgba(245, 158, 11, 0.18)", "rgba(245, 158, 11, 0.9)"),
            cell: HighlightStyle::new("rgba(139, 92, 246, 0.10)", "rgba(139, 92, 246, 0.7)"),
            default: HighlightStyle::new("rgba(250, 204, 21, 0.25)", "rgba(234, 179, 8, 0.9)"),
        }
    }
}
