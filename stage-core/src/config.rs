//! Stage configuration.

use serde::{Deserialize, Serialize};

use crate::{Rgb, StageError, StageResult};

/// Tunables for the interactive passes.
///
/// Sizes marked "physical" are in screen pixels and are divided by the fit
/// scale before use, so handles and outlines keep a constant on-screen size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Side length of a bounding-box handle, physical.
    pub handle_size: f64,
    /// Smallest width/height a bounding box can be resized to, content units.
    pub min_bbox_size: f64,
    /// Alpha of the brush preview fill.
    pub preview_fill_alpha: f64,
    /// Color of the preview outline ring.
    pub preview_ring_color: Rgb,
    /// Width of the preview outline ring, physical.
    pub preview_ring_width: f64,
    /// Color of the bounding-box outline and handle borders.
    pub bbox_stroke_color: Rgb,
    /// Fill color of bounding-box handles.
    pub handle_fill_color: Rgb,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            handle_size: 10.0,
            min_bbox_size: 1.0,
            preview_fill_alpha: 0.5,
            preview_ring_color: Rgb::new(0, 0, 0),
            preview_ring_width: 1.0,
            bbox_stroke_color: Rgb::new(0x3b, 0x82, 0xf6),
            handle_fill_color: Rgb::new(0xff, 0xff, 0xff),
        }
    }
}

impl StageConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> StageResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> StageResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let problem = if !positive(self.handle_size) {
            Some(format!("handle_size must be positive, got {}", self.handle_size))
        } else if !positive(self.min_bbox_size) {
            Some(format!("min_bbox_size must be positive, got {}", self.min_bbox_size))
        } else if !(0.0..=1.0).contains(&self.preview_fill_alpha) {
            Some(format!(
                "preview_fill_alpha must be in [0, 1], got {}",
                self.preview_fill_alpha
            ))
        } else if !positive(self.preview_ring_width) {
            Some(format!(
                "preview_ring_width must be positive, got {}",
                self.preview_ring_width
            ))
        } else {
            None
        };

        match problem {
            Some(msg) => {
                tracing::warn!("Rejected stage config: {msg}");
                Err(StageError::InvalidConfig(msg))
            }
            None => Ok(()),
        }
    }
}
