//! Engine configuration: one immutable struct, validated once at
//! construction.
//!
//! DESIGN
//! ======
//! Every tunable the engine consumes lives here with a canonical default from
//! [`crate::consts`]. Hosts build a config, hand it to
//! [`crate::engine::EngineCore::new`], and never mutate it afterwards; the
//! only post-construction knob is `set_zoom_limits`, which revalidates
//! through the same checks.
//!
//! ERROR HANDLING
//! ==============
//! A bad config is a programmer error, not device input: construction fails
//! fast with a [`ConfigError`] and nothing is built.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BASE_SIZE, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE, DEFAULT_PAPER_HEIGHT,
    DEFAULT_PAPER_WIDTH, DEFAULT_THINNING, PAN_THRESHOLD_PX, PAN_WINDOW_MS, WHEEL_ZOOM_STEP,
};
use crate::stroke::{Easing, StrokeStyle};

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("min scale must be strictly positive, got {0}")]
    NonPositiveMinScale(f64),
    #[error("min scale {min} exceeds max scale {max}")]
    InvertedScaleLimits { min: f64, max: f64 },
    #[error("scale limit is not finite: {0}")]
    NonFiniteScaleLimit(f64),
    #[error("brush base size must be strictly positive, got {0}")]
    NonPositiveBaseSize(f64),
    #[error("thinning must lie in [0, 1], got {0}")]
    ThinningOutOfRange(f64),
    #[error("pan threshold must be strictly positive, got {0}")]
    NonPositivePanThreshold(f64),
    #[error("wheel zoom step must exceed 1.0, got {0}")]
    InvalidWheelZoomStep(f64),
    #[error("paper dimensions must be strictly positive, got {width}x{height}")]
    NonPositivePaperSize { width: f64, height: f64 },
}

/// Validate a `[min, max]` viewport scale range.
///
/// Shared between initial construction and `set_zoom_limits`.
///
/// # Errors
///
/// Returns an error if either bound is non-finite, `min` is not strictly
/// positive, or the range is inverted.
pub fn validate_zoom_limits(min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() {
        return Err(ConfigError::NonFiniteScaleLimit(min));
    }
    if !max.is_finite() {
        return Err(ConfigError::NonFiniteScaleLimit(max));
    }
    if min <= 0.0 {
        return Err(ConfigError::NonPositiveMinScale(min));
    }
    if min > max {
        return Err(ConfigError::InvertedScaleLimits { min, max });
    }
    Ok(())
}

/// Immutable engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lower bound for the viewport scale. Must be strictly positive.
    pub min_scale: f64,
    /// Upper bound for the viewport scale.
    pub max_scale: f64,
    /// Milliseconds a touch press may linger before it can no longer pan.
    pub pan_window_ms: u64,
    /// Screen-pixel travel that promotes a pending touch press to a pan.
    pub pan_threshold_px: f64,
    /// Scale factor per wheel notch.
    pub wheel_zoom_step: f64,
    /// Paper width in content units.
    pub paper_width: f64,
    /// Paper height in content units.
    pub paper_height: f64,
    /// Brush style applied to every stroke.
    pub stroke: StrokeStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            pan_window_ms: PAN_WINDOW_MS,
            pan_threshold_px: PAN_THRESHOLD_PX,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            paper_width: DEFAULT_PAPER_WIDTH,
            paper_height: DEFAULT_PAPER_HEIGHT,
            stroke: StrokeStyle {
                base_size: DEFAULT_BASE_SIZE,
                thinning: DEFAULT_THINNING,
                easing: Easing::Linear,
            },
        }
    }
}

impl EngineConfig {
    /// Check every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_zoom_limits(self.min_scale, self.max_scale)?;
        if !self.stroke.base_size.is_finite() || self.stroke.base_size <= 0.0 {
            return Err(ConfigError::NonPositiveBaseSize(self.stroke.base_size));
        }
        if !self.stroke.thinning.is_finite() || !(0.0..=1.0).contains(&self.stroke.thinning) {
            return Err(ConfigError::ThinningOutOfRange(self.stroke.thinning));
        }
        if !self.pan_threshold_px.is_finite() || self.pan_threshold_px <= 0.0 {
            return Err(ConfigError::NonPositivePanThreshold(self.pan_threshold_px));
        }
        if !self.wheel_zoom_step.is_finite() || self.wheel_zoom_step <= 1.0 {
            return Err(ConfigError::InvalidWheelZoomStep(self.wheel_zoom_step));
        }
        if !self.paper_width.is_finite()
            || !self.paper_height.is_finite()
            || self.paper_width <= 0.0
            || self.paper_height <= 0.0
        {
            return Err(ConfigError::NonPositivePaperSize {
                width: self.paper_width,
                height: self.paper_height,
            });
        }
        Ok(())
    }
}
