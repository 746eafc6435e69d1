//! The engine controller: composes viewport, gesture recognition, and stroke
//! tessellation behind one event-driven surface.
//!
//! ARCHITECTURE
//! ============
//! The host wires device events to the `on_*` handlers and processes the
//! [`EngineEvent`]s they return (redraw, persist a finished stroke, refresh a
//! background grid). Intents recognized by the gesture state machine are
//! routed here: pan/zoom to the viewport, stroke intents to the active
//! stroke — which only starts when its first point lands on the paper.
//! Multi-touch always drives the viewport regardless of the active tool.
//!
//! The render pass is a leaf: [`EngineCore::render`] takes `&self` and can
//! not mutate engine state between events.
//!
//! Observability is injected, never global: an optional [`DebugSink`]
//! receives structured transition events, and `tracing` carries the logs.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigError, EngineConfig};
use crate::geometry::Point;
use crate::gesture::{GestureRecognizer, Intent, ToolMode};
use crate::paper::Paper;
use crate::pointer::{PointerSample, WheelDelta};
use crate::render::{self, Renderer};
use crate::store::StrokeStore;
use crate::stroke::{Primitive, Stroke, StrokeId, StrokePoint, tessellate};
use crate::viewport::{Viewport, ViewportTransform};

/// Events returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EngineEvent {
    /// The viewport moved or zoomed; background layers need a refresh.
    ViewportChanged { viewport: Viewport },
    /// The active stroke grew; `primitives` is its full current outline.
    StrokeUpdated { id: StrokeId, primitives: Vec<Primitive> },
    /// A stroke was sealed; `primitives` is its final outline.
    StrokeCompleted { id: StrokeId, primitives: Vec<Primitive> },
    /// Something visible changed; the host should schedule a redraw.
    RenderNeeded,
}

/// Structured events for an injected observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum DebugEvent {
    /// The gesture state machine moved between states.
    GestureTransition { from: &'static str, to: &'static str },
    /// A stroke start fell off the paper and was dropped.
    StrokeRejected { x: f64, y: f64 },
}

/// Receiver for [`DebugEvent`]s, injected at construction.
pub trait DebugSink {
    fn record(&mut self, event: DebugEvent);
}

/// The engine: one viewport, one gesture recognizer, one active stroke.
pub struct EngineCore {
    config: EngineConfig,
    viewport: ViewportTransform,
    recognizer: GestureRecognizer,
    paper: Paper,
    store: StrokeStore,
    active_stroke: Option<Stroke>,
    debug: Option<Box<dyn DebugSink>>,
}

impl EngineCore {
    /// Build an engine for a stage of the given size.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(stage_width: f64, stage_height: f64, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let viewport = ViewportTransform::new(
            stage_width,
            stage_height,
            config.paper_width,
            config.paper_height,
            config.min_scale,
            config.max_scale,
        )?;
        let recognizer = GestureRecognizer::new(&config);
        let paper = Paper::new(config.paper_width, config.paper_height);
        Ok(Self {
            config,
            viewport,
            recognizer,
            paper,
            store: StrokeStore::new(),
            active_stroke: None,
            debug: None,
        })
    }

    /// Attach a debug sink. Replaces any previous sink.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.debug = Some(sink);
        self
    }

    // --- Queries ---

    /// The current viewport state.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    /// Convert a screen-space point to content coordinates.
    #[must_use]
    pub fn to_content(&self, screen: Point) -> Point {
        self.viewport.to_content(screen)
    }

    /// The currently active tool.
    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.recognizer.mode()
    }

    /// The paper geometry.
    #[must_use]
    pub fn paper(&self) -> Paper {
        self.paper
    }

    /// Sealed strokes.
    #[must_use]
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    /// The in-progress stroke, if any.
    #[must_use]
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active_stroke.as_ref()
    }

    /// Name of the current gesture state, for diagnostics.
    #[must_use]
    pub fn gesture_name(&self) -> &'static str {
        self.recognizer.state().name()
    }

    // --- Configuration entry points ---

    /// Switch tools, sealing any in-progress stroke first.
    pub fn set_mode(&mut self, mode: ToolMode) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.mode() != mode {
            if let Some(event) = self.seal_active_stroke() {
                events.push(event);
            }
            debug!(?mode, "tool changed");
        }
        self.recognizer.set_mode(mode);
        events
    }

    /// Replace the zoom limits.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the limits are invalid; the old limits
    /// stay in force.
    pub fn set_zoom_limits(&mut self, min: f64, max: f64) -> Result<Vec<EngineEvent>, ConfigError> {
        if self.viewport.set_zoom_limits(min, max)? {
            Ok(self.viewport_changed_events())
        } else {
            Ok(Vec::new())
        }
    }

    /// The stage was resized: re-center the content at the current scale.
    pub fn resize(&mut self, stage_width: f64, stage_height: f64) -> Vec<EngineEvent> {
        if self.viewport.resize(stage_width, stage_height) {
            self.viewport_changed_events()
        } else {
            Vec::new()
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, sample: PointerSample) -> Vec<EngineEvent> {
        let before = self.gesture_name();
        let intents = self.recognizer.on_pointer_down(sample, self.viewport.scale());
        self.note_transition(before);
        self.apply(&intents)
    }

    pub fn on_pointer_move(&mut self, sample: PointerSample) -> Vec<EngineEvent> {
        let before = self.gesture_name();
        let intents = self.recognizer.on_pointer_move(sample);
        self.note_transition(before);
        self.apply(&intents)
    }

    pub fn on_pointer_up(&mut self, sample: PointerSample) -> Vec<EngineEvent> {
        let before = self.gesture_name();
        let intents = self.recognizer.on_pointer_up(sample);
        self.note_transition(before);
        self.apply(&intents)
    }

    /// Device-reported cancellation (palm rejection, OS interception).
    ///
    /// The gesture is dropped and any active stroke is sealed as-is, with no
    /// trailing tessellation update.
    pub fn on_pointer_cancel(&mut self, sample: PointerSample) -> Vec<EngineEvent> {
        let before = self.gesture_name();
        self.recognizer.on_pointer_cancel(sample);
        self.note_transition(before);
        match self.seal_active_stroke() {
            Some(event) => vec![event],
            None => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, delta: WheelDelta, at: Point) -> Vec<EngineEvent> {
        let intents = self.recognizer.on_wheel(delta, at);
        self.apply(&intents)
    }

    // --- Render ---

    /// Emit the current scene to a rendering backend. Read-only.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        render::draw(
            renderer,
            &self.viewport,
            &self.paper,
            &self.store,
            self.active_stroke.as_ref(),
            &self.config.stroke,
        );
    }

    // --- Intent routing ---

    fn apply(&mut self, intents: &[Intent]) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut dirty = false;

        for intent in intents {
            match *intent {
                Intent::Pan { dx, dy } => {
                    if self.viewport.pan_by(dx, dy) {
                        events.push(EngineEvent::ViewportChanged { viewport: self.viewport() });
                        dirty = true;
                    }
                }
                Intent::ZoomBy { factor, focal } => {
                    if self.viewport.zoom_by(focal, factor) {
                        events.push(EngineEvent::ViewportChanged { viewport: self.viewport() });
                        dirty = true;
                    }
                }
                Intent::ZoomTo { scale, focal } => {
                    if self.viewport.zoom_around(focal, scale) {
                        events.push(EngineEvent::ViewportChanged { viewport: self.viewport() });
                        dirty = true;
                    }
                }
                Intent::Tap { point } => {
                    // Touch taps have no pencil meaning; they only reach the
                    // debug sink and the logs.
                    debug!(x = point.x, y = point.y, "tap");
                }
                Intent::StrokeStart { point, pressure } => {
                    if let Some(event) = self.start_stroke(point, pressure) {
                        events.push(event);
                        dirty = true;
                    }
                }
                Intent::StrokeMove { point, pressure } => {
                    if let Some(event) = self.extend_stroke(point, pressure) {
                        events.push(event);
                        dirty = true;
                    }
                }
                Intent::StrokeEnd => {
                    if let Some(event) = self.seal_active_stroke() {
                        events.push(event);
                        dirty = true;
                    }
                }
            }
        }

        if dirty {
            events.push(EngineEvent::RenderNeeded);
        }
        events
    }

    /// Begin a stroke if its first point lands on the paper.
    fn start_stroke(&mut self, screen: Point, pressure: f64) -> Option<EngineEvent> {
        let content = self.viewport.to_content(screen);
        if !self.paper.contains_point(content) {
            debug!(x = content.x, y = content.y, "stroke start off paper, dropped");
            self.record_debug(DebugEvent::StrokeRejected { x: content.x, y: content.y });
            return None;
        }
        let stroke = Stroke::start(StrokePoint::new(content.x, content.y, pressure));
        let event = EngineEvent::StrokeUpdated {
            id: stroke.id,
            primitives: tessellate(&stroke.points, &self.config.stroke),
        };
        self.active_stroke = Some(stroke);
        Some(event)
    }

    /// Append to the active stroke, retessellating the outline.
    fn extend_stroke(&mut self, screen: Point, pressure: f64) -> Option<EngineEvent> {
        let content = self.viewport.to_content(screen);
        let stroke = self.active_stroke.as_mut()?;
        stroke.push(StrokePoint::new(content.x, content.y, pressure));
        Some(EngineEvent::StrokeUpdated {
            id: stroke.id,
            primitives: tessellate(&stroke.points, &self.config.stroke),
        })
    }

    /// Seal the active stroke and move it into the store.
    fn seal_active_stroke(&mut self) -> Option<EngineEvent> {
        let mut stroke = self.active_stroke.take()?;
        stroke.seal();
        let event = EngineEvent::StrokeCompleted {
            id: stroke.id,
            primitives: tessellate(&stroke.points, &self.config.stroke),
        };
        debug!(id = %stroke.id, points = stroke.points.len(), "stroke sealed");
        self.store.insert(stroke);
        Some(event)
    }

    fn viewport_changed_events(&self) -> Vec<EngineEvent> {
        vec![
            EngineEvent::ViewportChanged { viewport: self.viewport() },
            EngineEvent::RenderNeeded,
        ]
    }

    fn note_transition(&mut self, before: &'static str) {
        let after = self.gesture_name();
        if before != after {
            self.record_debug(DebugEvent::GestureTransition { from: before, to: after });
        }
    }

    fn record_debug(&mut self, event: DebugEvent) {
        if let Some(sink) = self.debug.as_mut() {
            sink.record(event);
        }
    }
}
