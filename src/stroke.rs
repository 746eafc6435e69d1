//! Freehand strokes and their tessellation into renderable primitives.
//!
//! A stroke is an ordered list of pressure-tagged content-space samples. The
//! tessellator turns it into filled primitives: one quad per segment (edges
//! offset by the local pressure radius along the segment normal) plus one
//! disc per sample for rounded caps and joint cover. The whole outline is
//! recomputed from scratch on every new sample; point counts are bounded by
//! the input event rate, so the linear recompute is cheap.
//!
//! Tessellation is a pure function of `(points, style)` — calling it twice on
//! the same input yields identical primitive lists.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DUPLICATE_POINT_EPSILON, STROKE_MIN_RADIUS_RATIO};
use crate::geometry::{Point, segment_normal};

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// One pressure-tagged sample of a stroke, in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Normalized pressure in `[0, 1]`.
    pub pressure: f64,
}

impl StrokePoint {
    #[must_use]
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }

    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One continuous freehand stroke from pointer-down to pointer-up.
///
/// Mutable while being drawn; immutable once sealed and handed to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<StrokePoint>,
    pub is_finished: bool,
}

impl Stroke {
    /// Start a stroke at its first sample.
    #[must_use]
    pub fn start(first: StrokePoint) -> Self {
        Self { id: Uuid::new_v4(), points: vec![first], is_finished: false }
    }

    /// Append a sample. Sealed strokes reject further points.
    pub fn push(&mut self, sample: StrokePoint) {
        if !self.is_finished {
            self.points.push(sample);
        }
    }

    /// Seal the stroke; no more samples will be accepted.
    pub fn seal(&mut self) {
        self.is_finished = true;
    }
}

/// Monotonic easing applied to pressure before it widens the stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    /// Identity: width tracks pressure linearly.
    Linear,
    /// `1 - (1 - t)^2`: fast attack, soft approach to full width.
    EaseOut,
}

impl Easing {
    /// Evaluate the easing at `t ∈ [0, 1]`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
        }
    }
}

/// Brush parameters for tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Brush diameter in content units at full pressure.
    pub base_size: f64,
    /// How strongly pressure thins the stroke, in `[0, 1]`. Zero means
    /// constant width.
    pub thinning: f64,
    /// Pressure response curve.
    pub easing: Easing,
}

impl StrokeStyle {
    /// Radius at `pressure`, floored so zero pressure still leaves ink.
    #[must_use]
    pub fn radius(&self, pressure: f64) -> f64 {
        let eased = self.easing.apply(pressure.clamp(0.0, 1.0));
        let r = self.base_size / 2.0 * (1.0 - self.thinning * (1.0 - eased));
        r.max(self.base_size * STROKE_MIN_RADIUS_RATIO)
    }
}

/// A filled primitive produced by tessellation, in content coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Primitive {
    /// Quadrilateral covering one stroke segment. Vertices wind around the
    /// segment: left edge start, left edge end, right edge end, right edge
    /// start.
    Quad { vertices: [Point; 4] },
    /// Filled disc covering a joint or cap.
    Disc { center: Point, radius: f64 },
}

/// Tessellate a sample list into filled primitives.
///
/// Emits one quad per non-degenerate consecutive pair, then one disc per
/// sample. Consecutive samples closer than [`DUPLICATE_POINT_EPSILON`] are
/// skipped when forming quads (their normal is meaningless) but still get
/// their disc. Zero samples produce zero primitives; a single sample produces
/// exactly one disc.
#[must_use]
pub fn tessellate(points: &[StrokePoint], style: &StrokeStyle) -> Vec<Primitive> {
    let mut primitives = Vec::with_capacity(points.len().saturating_mul(2));

    // Segment quads. Walk from each sample to the next one far enough away
    // to carry a usable normal.
    let mut anchor = 0;
    for i in 1..points.len() {
        let a = points[anchor];
        let b = points[i];
        let Some(normal) = segment_normal(a.point(), b.point(), DUPLICATE_POINT_EPSILON) else {
            continue;
        };
        let ra = style.radius(a.pressure);
        let rb = style.radius(b.pressure);
        primitives.push(Primitive::Quad {
            vertices: [
                Point::new(a.x + normal.x * ra, a.y + normal.y * ra),
                Point::new(b.x + normal.x * rb, b.y + normal.y * rb),
                Point::new(b.x - normal.x * rb, b.y - normal.y * rb),
                Point::new(a.x - normal.x * ra, a.y - normal.y * ra),
            ],
        });
        anchor = i;
    }

    // Joint/cap discs, one per sample, duplicates included.
    for p in points {
        primitives.push(Primitive::Disc {
            center: p.point(),
            radius: style.radius(p.pressure),
        });
    }

    primitives
}
