//! Gesture recognition: the state machine that classifies raw pointer events
//! into pan, zoom, tap, and stroke intents.
//!
//! DESIGN
//! ======
//! Each handler consumes one device event, mutates exactly one
//! [`GestureState`], and returns the [`Intent`]s the owner should route
//! (the engine applies them to the viewport or the active stroke). A single
//! touch starts out ambiguous (`PanPending`) and is promoted to a pan once it
//! travels far enough within the time window, demoted to nothing once the
//! window lapses, or classified as a tap on a quick short release. A second
//! touch always pre-empts single-finger tracking and starts a pinch.
//!
//! Timing is evaluated lazily from sample timestamps at the next event; there
//! is no timer. Inconsistent bookkeeping (moves and ups for untracked ids)
//! is silently ignored — device input must never crash the engine.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::consts::PINCH_MIN_DISTANCE_PX;
use crate::geometry::Point;
use crate::pointer::{ActivePointers, PointerKind, PointerSample, WheelDelta};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Freehand pencil: mouse/pen draws, touch pans and zooms.
    #[default]
    Pencil,
    /// Zoom-pan tool: every single-pointer drag pans the view.
    ZoomPan,
}

/// A recognized intention, emitted for the owner to route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Shift the viewport by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Multiply the viewport scale, keeping `focal` fixed.
    ZoomBy { factor: f64, focal: Point },
    /// Set the viewport scale to an absolute value, keeping `focal` fixed.
    ZoomTo { scale: f64, focal: Point },
    /// A quick short touch press-then-release.
    Tap { point: Point },
    /// Begin a stroke at a screen-space point.
    StrokeStart { point: Point, pressure: f64 },
    /// Extend the active stroke.
    StrokeMove { point: Point, pressure: f64 },
    /// Finish the active stroke.
    StrokeEnd,
}

/// Internal state of the gesture state machine.
///
/// Each active variant carries the context needed to compute incremental
/// deltas at the next event. Idle is both the initial and the terminal state;
/// there are no fatal states.
#[derive(Debug, Clone, Copy)]
pub enum GestureState {
    /// No gesture in progress.
    Idle,
    /// A single touch is down but not yet classified as pan or tap.
    PanPending {
        /// The sample that opened the gesture; carries the start time.
        start: PointerSample,
        /// Signed travel accumulated since `start`.
        accumulated_dx: f64,
        accumulated_dy: f64,
        /// Position at the previous event, for per-move deltas.
        last_x: f64,
        last_y: f64,
    },
    /// A single pointer is panning the table.
    Panning {
        pointer_id: i64,
        last_x: f64,
        last_y: f64,
    },
    /// Two pointers are zooming. The baseline is snapshotted at gesture
    /// start; the focal point tracks the live midpoint.
    PinchZooming {
        initial_distance: f64,
        initial_scale: f64,
        initial_center: Point,
        last_center: Point,
    },
    /// A mouse/pen stroke is in progress (delegated to the engine).
    Stroking { pointer_id: i64 },
    /// Single-pointer drag-to-pan after a pinch ended or while the zoom-pan
    /// tool is active.
    DraggingInZoomMode {
        pointer_id: i64,
        last_x: f64,
        last_y: f64,
    },
}

impl Default for GestureState {
    fn default() -> Self {
        Self::Idle
    }
}

impl GestureState {
    /// Short state name for logs and debug sinks.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PanPending { .. } => "pan_pending",
            Self::Panning { .. } => "panning",
            Self::PinchZooming { .. } => "pinch_zooming",
            Self::Stroking { .. } => "stroking",
            Self::DraggingInZoomMode { .. } => "dragging_in_zoom_mode",
        }
    }
}

/// The gesture state machine.
///
/// Owns [`GestureState`] and [`ActivePointers`]; both are mutated only on
/// this recognizer's own event path.
#[derive(Debug)]
pub struct GestureRecognizer {
    state: GestureState,
    pointers: ActivePointers,
    mode: ToolMode,
    pan_window_ms: u64,
    pan_threshold_px: f64,
    wheel_zoom_step: f64,
}

impl GestureRecognizer {
    /// Build a recognizer with the thresholds from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: GestureState::Idle,
            pointers: ActivePointers::new(),
            mode: ToolMode::default(),
            pan_window_ms: config.pan_window_ms,
            pan_threshold_px: config.pan_threshold_px,
            wheel_zoom_step: config.wheel_zoom_step,
        }
    }

    /// Current state (read-only).
    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Currently active tool.
    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Number of pointers currently down.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Switch tools. An in-progress stroke must be sealed by the owner
    /// before calling this; the stroking state itself is dropped here.
    pub fn set_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
        if matches!(self.state, GestureState::Stroking { .. }) {
            self.transition(GestureState::Idle);
        }
    }

    fn transition(&mut self, next: GestureState) {
        if self.state.name() != next.name() {
            debug!(from = self.state.name(), to = next.name(), "gesture transition");
        }
        self.state = next;
    }

    /// Handle pointer-down. `viewport_scale` is the current viewport scale,
    /// snapshotted as the pinch baseline when a pinch begins.
    pub fn on_pointer_down(&mut self, sample: PointerSample, viewport_scale: f64) -> Vec<Intent> {
        self.pointers.insert(sample);

        match self.state {
            GestureState::Idle => {
                if self.mode == ToolMode::ZoomPan {
                    self.transition(GestureState::DraggingInZoomMode {
                        pointer_id: sample.id,
                        last_x: sample.x,
                        last_y: sample.y,
                    });
                    vec![]
                } else if sample.kind.draws() {
                    self.transition(GestureState::Stroking { pointer_id: sample.id });
                    vec![Intent::StrokeStart { point: sample.point(), pressure: sample.pressure }]
                } else {
                    self.transition(GestureState::PanPending {
                        start: sample,
                        accumulated_dx: 0.0,
                        accumulated_dy: 0.0,
                        last_x: sample.x,
                        last_y: sample.y,
                    });
                    vec![]
                }
            }
            GestureState::PanPending { .. }
            | GestureState::Panning { .. }
            | GestureState::DraggingInZoomMode { .. } => {
                // A second finger always pre-empts single-pointer tracking.
                if sample.kind == PointerKind::Touch {
                    self.try_begin_pinch(viewport_scale);
                }
                vec![]
            }
            GestureState::PinchZooming { .. } | GestureState::Stroking { .. } => vec![],
        }
    }

    /// Establish the pinch baseline from the two earliest tracked touches.
    fn try_begin_pinch(&mut self, viewport_scale: f64) {
        let Some((a, b)) = self.pointers.first_two_touches() else {
            return;
        };
        let center = a.point().midpoint(b.point());
        self.transition(GestureState::PinchZooming {
            initial_distance: a.point().distance_to(b.point()),
            initial_scale: viewport_scale,
            initial_center: center,
            last_center: center,
        });
    }

    /// Handle pointer-move.
    pub fn on_pointer_move(&mut self, sample: PointerSample) -> Vec<Intent> {
        if !self.pointers.update(sample) {
            // Hover or unknown pointer: nothing to do.
            return vec![];
        }

        match self.state {
            GestureState::Idle => vec![],
            GestureState::PanPending { start, accumulated_dx, accumulated_dy, last_x, last_y } => {
                if sample.id != start.id {
                    return vec![];
                }
                let elapsed = sample.timestamp_ms.saturating_sub(start.timestamp_ms);
                if elapsed > self.pan_window_ms {
                    // Held too long without travelling: no longer a pan.
                    self.transition(GestureState::Idle);
                    return vec![];
                }
                let dx = sample.x - last_x;
                let dy = sample.y - last_y;
                let acc_dx = accumulated_dx + dx;
                let acc_dy = accumulated_dy + dy;
                if acc_dx.hypot(acc_dy) > self.pan_threshold_px {
                    self.transition(GestureState::Panning {
                        pointer_id: sample.id,
                        last_x: sample.x,
                        last_y: sample.y,
                    });
                    // Flush the travel backlog, then this move's delta.
                    let mut intents = Vec::with_capacity(2);
                    if accumulated_dx != 0.0 || accumulated_dy != 0.0 {
                        intents.push(Intent::Pan { dx: accumulated_dx, dy: accumulated_dy });
                    }
                    intents.push(Intent::Pan { dx, dy });
                    return intents;
                }
                self.state = GestureState::PanPending {
                    start,
                    accumulated_dx: acc_dx,
                    accumulated_dy: acc_dy,
                    last_x: sample.x,
                    last_y: sample.y,
                };
                vec![]
            }
            GestureState::Panning { pointer_id, last_x, last_y } => {
                if sample.id != pointer_id {
                    return vec![];
                }
                self.state = GestureState::Panning {
                    pointer_id,
                    last_x: sample.x,
                    last_y: sample.y,
                };
                vec![Intent::Pan { dx: sample.x - last_x, dy: sample.y - last_y }]
            }
            GestureState::PinchZooming {
                initial_distance,
                initial_scale,
                initial_center,
                last_center,
            } => {
                let Some((a, b)) = self.pointers.first_two_touches() else {
                    return vec![];
                };
                let center = a.point().midpoint(b.point());
                let distance = a.point().distance_to(b.point());

                let mut intents = Vec::with_capacity(2);
                let dx = center.x - last_center.x;
                let dy = center.y - last_center.y;
                if dx != 0.0 || dy != 0.0 {
                    intents.push(Intent::Pan { dx, dy });
                }
                // Focal on the live midpoint: content under the fingers stays
                // under the fingers frame-to-frame.
                if initial_distance >= PINCH_MIN_DISTANCE_PX && distance >= PINCH_MIN_DISTANCE_PX {
                    intents.push(Intent::ZoomTo {
                        scale: initial_scale * distance / initial_distance,
                        focal: center,
                    });
                }
                self.state = GestureState::PinchZooming {
                    initial_distance,
                    initial_scale,
                    initial_center,
                    last_center: center,
                };
                intents
            }
            GestureState::Stroking { pointer_id } => {
                if sample.id != pointer_id {
                    return vec![];
                }
                vec![Intent::StrokeMove { point: sample.point(), pressure: sample.pressure }]
            }
            GestureState::DraggingInZoomMode { pointer_id, last_x, last_y } => {
                if sample.id != pointer_id {
                    return vec![];
                }
                self.state = GestureState::DraggingInZoomMode {
                    pointer_id,
                    last_x: sample.x,
                    last_y: sample.y,
                };
                vec![Intent::Pan { dx: sample.x - last_x, dy: sample.y - last_y }]
            }
        }
    }

    /// Handle pointer-up.
    pub fn on_pointer_up(&mut self, sample: PointerSample) -> Vec<Intent> {
        if self.pointers.remove(sample.id).is_none() {
            // Up for a pointer we never saw: ignore.
            return vec![];
        }

        match self.state {
            GestureState::Idle => vec![],
            GestureState::PanPending { start, accumulated_dx, accumulated_dy, .. } => {
                if sample.id != start.id {
                    return vec![];
                }
                self.transition(GestureState::Idle);
                let elapsed = sample.timestamp_ms.saturating_sub(start.timestamp_ms);
                let travelled = accumulated_dx.hypot(accumulated_dy);
                if elapsed <= self.pan_window_ms && travelled <= self.pan_threshold_px {
                    vec![Intent::Tap { point: sample.point() }]
                } else {
                    vec![]
                }
            }
            GestureState::Panning { pointer_id, .. } => {
                if sample.id == pointer_id {
                    self.transition(GestureState::Idle);
                }
                vec![]
            }
            GestureState::PinchZooming { .. } => {
                match self.pointers.first_touch() {
                    Some(remaining) if self.mode == ToolMode::ZoomPan => {
                        self.transition(GestureState::DraggingInZoomMode {
                            pointer_id: remaining.id,
                            last_x: remaining.x,
                            last_y: remaining.y,
                        });
                    }
                    _ => self.transition(GestureState::Idle),
                }
                vec![]
            }
            GestureState::Stroking { pointer_id } => {
                if sample.id == pointer_id {
                    self.transition(GestureState::Idle);
                    vec![Intent::StrokeEnd]
                } else {
                    vec![]
                }
            }
            GestureState::DraggingInZoomMode { pointer_id, .. } => {
                if sample.id == pointer_id {
                    self.transition(GestureState::Idle);
                }
                vec![]
            }
        }
    }

    /// Handle pointer-cancel (palm rejection, OS gesture interception).
    ///
    /// Drops the whole gesture: the owner seals any active stroke itself,
    /// without a trailing tessellation update.
    pub fn on_pointer_cancel(&mut self, sample: PointerSample) -> Vec<Intent> {
        if self.pointers.remove(sample.id).is_none() {
            return vec![];
        }
        self.transition(GestureState::Idle);
        vec![]
    }

    /// Handle a wheel event at `at` (screen space). Zooms only while idle.
    pub fn on_wheel(&mut self, delta: WheelDelta, at: Point) -> Vec<Intent> {
        if !matches!(self.state, GestureState::Idle) {
            return vec![];
        }
        if delta.dy == 0.0 || !delta.dy.is_finite() {
            return vec![];
        }
        let factor = if delta.dy < 0.0 {
            self.wheel_zoom_step
        } else {
            1.0 / self.wheel_zoom_step
        };
        vec![Intent::ZoomBy { factor, focal: at }]
    }
}
