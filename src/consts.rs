//! Shared numeric constants for the ink engine.

// ── Gesture disambiguation ──────────────────────────────────────

/// Time window in milliseconds during which a single touch may still become a
/// pan. A press that neither travels far enough nor releases within this
/// window stops being a pan candidate.
pub const PAN_WINDOW_MS: u64 = 500;

/// Accumulated travel in screen pixels that promotes a pending touch press
/// into a pan.
pub const PAN_THRESHOLD_PX: f64 = 20.0;

/// Minimum finger separation in screen pixels for pinch math. Below this the
/// distance ratio is meaningless and zoom is not emitted.
pub const PINCH_MIN_DISTANCE_PX: f64 = 1.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Default lower bound for the viewport scale.
pub const DEFAULT_MIN_SCALE: f64 = 0.1;

/// Default upper bound for the viewport scale.
pub const DEFAULT_MAX_SCALE: f64 = 3.0;

/// Scale factor applied per wheel notch. Scroll up multiplies by this,
/// scroll down divides.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

// ── Stroke tessellation ─────────────────────────────────────────

/// Consecutive samples closer than this (content units) are skipped when
/// building segment quads; degenerate normals otherwise.
pub const DUPLICATE_POINT_EPSILON: f64 = 0.1;

/// Floor on the per-sample radius as a fraction of the brush base size.
/// Zero pressure with full thinning must still leave visible ink.
pub const STROKE_MIN_RADIUS_RATIO: f64 = 0.05;

/// Vertex count used when a cap/joint disc is polygonized for a renderer.
pub const DISC_SEGMENTS: usize = 24;

/// Default brush diameter in content units.
pub const DEFAULT_BASE_SIZE: f64 = 6.0;

/// Default pressure thinning amount.
pub const DEFAULT_THINNING: f64 = 0.5;

// ── Paper ───────────────────────────────────────────────────────

/// Default paper width in content units.
pub const DEFAULT_PAPER_WIDTH: f64 = 1600.0;

/// Default paper height in content units.
pub const DEFAULT_PAPER_HEIGHT: f64 = 1200.0;
