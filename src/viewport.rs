//! Viewport state and the affine mapping between content and screen space.
//!
//! The content area (paper) is centered inside the stage; `translate_x` /
//! `translate_y` shift it from that centered position and `scale` zooms it.
//! Conversions go through the centering offset
//! `center_x = (stage_w - content_w * scale) / 2 + translate_x` (y analogous),
//! so a fresh viewport shows the paper centered at scale 1.
//!
//! ERROR HANDLING
//! ==============
//! Mutations that would produce a non-finite scale or translate are rejected
//! and the prior viewport is kept. Scale is clamped to the configured limits
//! on every zoom; panning is never clamped and content may leave the stage.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, validate_zoom_limits};
use crate::geometry::Point;

/// Viewport state: the mapping from content space to screen space.
///
/// `scale` is a zoom factor (1.0 = no zoom). Translations are in screen
/// pixels relative to the centered position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, translate_x: 0.0, translate_y: 0.0 }
    }
}

/// Owns a [`Viewport`] together with the stage/content geometry and scale
/// limits, and performs every mutation and coordinate conversion.
#[derive(Debug, Clone)]
pub struct ViewportTransform {
    viewport: Viewport,
    stage_width: f64,
    stage_height: f64,
    content_width: f64,
    content_height: f64,
    min_scale: f64,
    max_scale: f64,
}

impl ViewportTransform {
    /// Create a transform for the given stage and content sizes.
    ///
    /// The initial scale is 1.0 clamped into `[min_scale, max_scale]`, with
    /// no translation (content centered).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the scale limits are invalid.
    pub fn new(
        stage_width: f64,
        stage_height: f64,
        content_width: f64,
        content_height: f64,
        min_scale: f64,
        max_scale: f64,
    ) -> Result<Self, ConfigError> {
        validate_zoom_limits(min_scale, max_scale)?;
        Ok(Self {
            viewport: Viewport {
                scale: 1.0_f64.clamp(min_scale, max_scale),
                translate_x: 0.0,
                translate_y: 0.0,
            },
            stage_width,
            stage_height,
            content_width,
            content_height,
            min_scale,
            max_scale,
        })
    }

    /// The current viewport state.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The current scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.viewport.scale
    }

    /// Screen position of the content origin (content point `(0, 0)`).
    #[must_use]
    pub fn content_origin(&self) -> Point {
        self.to_screen(Point::new(0.0, 0.0))
    }

    fn center_offset(&self) -> (f64, f64) {
        let cx = (self.stage_width - self.content_width * self.viewport.scale) / 2.0
            + self.viewport.translate_x;
        let cy = (self.stage_height - self.content_height * self.viewport.scale) / 2.0
            + self.viewport.translate_y;
        (cx, cy)
    }

    /// Convert a screen-space point to content coordinates.
    #[must_use]
    pub fn to_content(&self, screen: Point) -> Point {
        let (cx, cy) = self.center_offset();
        Point {
            x: (screen.x - cx) / self.viewport.scale,
            y: (screen.y - cy) / self.viewport.scale,
        }
    }

    /// Convert a content-space point to screen coordinates.
    #[must_use]
    pub fn to_screen(&self, content: Point) -> Point {
        let (cx, cy) = self.center_offset();
        Point {
            x: content.x * self.viewport.scale + cx,
            y: content.y * self.viewport.scale + cy,
        }
    }

    /// Zoom to `new_scale` (clamped into the limits) while keeping the
    /// content point under `focal` fixed at that exact screen position.
    ///
    /// Returns `true` if the viewport changed.
    pub fn zoom_around(&mut self, focal: Point, new_scale: f64) -> bool {
        if !new_scale.is_finite() || !focal.is_finite() {
            debug!(new_scale, "zoom rejected: non-finite input");
            return false;
        }
        let clamped = new_scale.clamp(self.min_scale, self.max_scale);
        if clamped == self.viewport.scale {
            return false;
        }

        // Capture the anchor before touching scale, then solve the translate
        // that maps it back under the focal point.
        let anchor = self.to_content(focal);
        let translate_x = focal.x
            - anchor.x * clamped
            - (self.stage_width - self.content_width * clamped) / 2.0;
        let translate_y = focal.y
            - anchor.y * clamped
            - (self.stage_height - self.content_height * clamped) / 2.0;
        if !translate_x.is_finite() || !translate_y.is_finite() {
            debug!(clamped, "zoom rejected: non-finite translate");
            return false;
        }

        let next = Viewport { scale: clamped, translate_x, translate_y };
        if next == self.viewport {
            return false;
        }
        self.viewport = next;
        true
    }

    /// Zoom by a multiplicative `factor` around `focal`.
    ///
    /// Returns `true` if the viewport changed.
    pub fn zoom_by(&mut self, focal: Point, factor: f64) -> bool {
        self.zoom_around(focal, self.viewport.scale * factor)
    }

    /// Shift the viewport by `(dx, dy)` screen pixels. Unclamped: content may
    /// pan arbitrarily far off the stage.
    ///
    /// Returns `true` if the viewport changed.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            debug!(dx, dy, "pan rejected: non-finite delta");
            return false;
        }
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.viewport.translate_x += dx;
        self.viewport.translate_y += dy;
        true
    }

    /// Update the stage size and re-center the content. Scale is preserved.
    ///
    /// Returns `true` if the viewport or stage geometry changed.
    pub fn resize(&mut self, stage_width: f64, stage_height: f64) -> bool {
        if !stage_width.is_finite()
            || !stage_height.is_finite()
            || stage_width <= 0.0
            || stage_height <= 0.0
        {
            debug!(stage_width, stage_height, "resize rejected: invalid stage size");
            return false;
        }
        let unchanged = self.stage_width == stage_width
            && self.stage_height == stage_height
            && self.viewport.translate_x == 0.0
            && self.viewport.translate_y == 0.0;
        if unchanged {
            return false;
        }
        self.stage_width = stage_width;
        self.stage_height = stage_height;
        self.viewport.translate_x = 0.0;
        self.viewport.translate_y = 0.0;
        true
    }

    /// Replace the scale limits, re-clamping the current scale around the
    /// stage center if it now falls outside the new range.
    ///
    /// Returns `true` if the viewport changed.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the new limits are invalid; the previous
    /// limits are kept.
    pub fn set_zoom_limits(&mut self, min: f64, max: f64) -> Result<bool, ConfigError> {
        validate_zoom_limits(min, max)?;
        self.min_scale = min;
        self.max_scale = max;
        if self.viewport.scale < min || self.viewport.scale > max {
            let center = Point::new(self.stage_width / 2.0, self.stage_height / 2.0);
            return Ok(self.zoom_around(center, self.viewport.scale));
        }
        Ok(false)
    }
}
