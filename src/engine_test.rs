#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::geometry::Rect;
use crate::pointer::PointerKind;

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// =============================================================
// Helpers
// =============================================================

/// Stage 800x600 around a 400x300 paper: content center (200, 150) sits at
/// stage center (400, 300).
fn config() -> EngineConfig {
    EngineConfig { paper_width: 400.0, paper_height: 300.0, ..Default::default() }
}

fn engine() -> EngineCore {
    EngineCore::new(800.0, 600.0, config()).unwrap()
}

fn sample(id: i64, x: f64, y: f64, kind: PointerKind, ts: u64) -> PointerSample {
    PointerSample { id, x, y, pressure: 0.5, kind, timestamp_ms: ts }
}

fn touch(id: i64, x: f64, y: f64, ts: u64) -> PointerSample {
    sample(id, x, y, PointerKind::Touch, ts)
}

fn pen(id: i64, x: f64, y: f64, ts: u64) -> PointerSample {
    sample(id, x, y, PointerKind::Pen, ts)
}

fn mouse(id: i64, x: f64, y: f64, ts: u64) -> PointerSample {
    sample(id, x, y, PointerKind::Mouse, ts)
}

fn has_render_needed(events: &[EngineEvent]) -> bool {
    events.iter().any(|e| matches!(e, EngineEvent::RenderNeeded))
}

fn has_viewport_changed(events: &[EngineEvent]) -> bool {
    events.iter().any(|e| matches!(e, EngineEvent::ViewportChanged { .. }))
}

fn has_stroke_updated(events: &[EngineEvent]) -> bool {
    events.iter().any(|e| matches!(e, EngineEvent::StrokeUpdated { .. }))
}

fn completed(events: &[EngineEvent]) -> Option<(StrokeId, usize)> {
    events.iter().find_map(|e| match e {
        EngineEvent::StrokeCompleted { id, primitives } => Some((*id, primitives.len())),
        _ => None,
    })
}

#[derive(Default, Clone)]
struct RecordingSink(Rc<RefCell<Vec<DebugEvent>>>);

impl DebugSink for RecordingSink {
    fn record(&mut self, event: DebugEvent) {
        self.0.borrow_mut().push(event);
    }
}

struct CountingRenderer {
    transforms: usize,
    clips: Vec<Rect>,
    polygons: usize,
}

impl CountingRenderer {
    fn new() -> Self {
        Self { transforms: 0, clips: Vec::new(), polygons: 0 }
    }
}

impl crate::render::Renderer for CountingRenderer {
    fn set_transform(&mut self, _scale: f64, _offset_x: f64, _offset_y: f64) {
        self.transforms += 1;
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.clips.push(rect);
    }

    fn draw_polygon(&mut self, _vertices: &[Point]) {
        self.polygons += 1;
    }
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_engine_has_identity_viewport() {
    let e = engine();
    let v = e.viewport();
    assert_eq!(v.scale, 1.0);
    assert_eq!(v.translate_x, 0.0);
    assert_eq!(v.translate_y, 0.0);
}

#[test]
fn new_engine_is_in_pencil_mode_with_no_strokes() {
    let e = engine();
    assert_eq!(e.mode(), ToolMode::Pencil);
    assert!(e.store().is_empty());
    assert!(e.active_stroke().is_none());
    assert_eq!(e.gesture_name(), "idle");
}

#[test]
fn new_rejects_invalid_min_scale() {
    let bad = EngineConfig { min_scale: 0.0, ..config() };
    assert!(EngineCore::new(800.0, 600.0, bad).is_err());
}

#[test]
fn new_rejects_invalid_thinning() {
    let mut bad = config();
    bad.stroke.thinning = 2.0;
    assert!(EngineCore::new(800.0, 600.0, bad).is_err());
}

#[test]
fn content_center_sits_at_stage_center() {
    let e = engine();
    assert!(point_approx_eq(e.to_content(Point::new(400.0, 300.0)), Point::new(200.0, 150.0)));
}

// =============================================================
// Wheel zoom
// =============================================================

#[test]
fn wheel_up_zooms_in_and_reports_events() {
    let mut e = engine();
    let events = e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    assert!(has_viewport_changed(&events));
    assert!(has_render_needed(&events));
    assert!(e.viewport().scale > 1.0);
}

#[test]
fn wheel_down_zooms_out() {
    let mut e = engine();
    e.on_wheel(WheelDelta { dx: 0.0, dy: 120.0 }, Point::new(400.0, 300.0));
    assert!(e.viewport().scale < 1.0);
}

#[test]
fn wheel_zoom_keeps_cursor_content_fixed() {
    let mut e = engine();
    let cursor = Point::new(250.0, 420.0);
    let anchor = e.to_content(cursor);
    e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, cursor);
    assert!(point_approx_eq(e.to_content(cursor), anchor));
}

#[test]
fn wheel_at_scale_ceiling_reports_nothing() {
    let mut e = engine();
    // Ride the wheel to the 3.0 ceiling, then once more.
    for _ in 0..40 {
        e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    }
    assert!(approx_eq(e.viewport().scale, 3.0));
    let events = e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    assert!(events.is_empty());
}

// =============================================================
// Pen strokes
// =============================================================

#[test]
fn pen_down_on_paper_starts_stroke() {
    let mut e = engine();
    let events = e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    assert!(has_stroke_updated(&events));
    assert!(has_render_needed(&events));
    let stroke = e.active_stroke().expect("stroke should be active");
    assert_eq!(stroke.points.len(), 1);
    assert!(!stroke.is_finished);
}

#[test]
fn stroke_points_are_stored_in_content_space() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let p = e.active_stroke().unwrap().points[0];
    assert!(approx_eq(p.x, 200.0));
    assert!(approx_eq(p.y, 150.0));
}

#[test]
fn stroke_points_respect_current_zoom() {
    let mut e = engine();
    e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    let expected = e.to_content(Point::new(500.0, 300.0));
    e.on_pointer_down(pen(1, 500.0, 300.0, 0));
    let p = e.active_stroke().unwrap().points[0];
    assert!(approx_eq(p.x, expected.x));
    assert!(approx_eq(p.y, expected.y));
}

#[test]
fn pen_moves_grow_the_stroke() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let events = e.on_pointer_move(pen(1, 410.0, 305.0, 10));
    assert!(has_stroke_updated(&events));
    e.on_pointer_move(pen(1, 420.0, 310.0, 20));
    assert_eq!(e.active_stroke().unwrap().points.len(), 3);
}

#[test]
fn stroke_updates_carry_growing_primitive_lists() {
    let mut e = engine();
    let down = e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let first = down.iter().find_map(|e| match e {
        EngineEvent::StrokeUpdated { primitives, .. } => Some(primitives.len()),
        _ => None,
    });
    assert_eq!(first, Some(1));

    let moved = e.on_pointer_move(pen(1, 420.0, 300.0, 10));
    let second = moved.iter().find_map(|e| match e {
        EngineEvent::StrokeUpdated { primitives, .. } => Some(primitives.len()),
        _ => None,
    });
    // One segment quad plus two discs.
    assert_eq!(second, Some(3));
}

#[test]
fn pen_up_seals_and_stores_the_stroke() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_move(pen(1, 420.0, 300.0, 10));
    let events = e.on_pointer_up(pen(1, 420.0, 300.0, 20));

    let (id, primitives) = completed(&events).expect("expected StrokeCompleted");
    assert!(primitives > 0);
    assert!(e.active_stroke().is_none());
    assert_eq!(e.store().len(), 1);
    assert!(e.store().get(&id).unwrap().is_finished);
}

#[test]
fn quick_pen_tap_draws_a_dot() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let events = e.on_pointer_up(pen(1, 400.0, 300.0, 40));
    let (_, primitives) = completed(&events).expect("expected StrokeCompleted");
    // A single-sample stroke tessellates to exactly one disc.
    assert_eq!(primitives, 1);
    assert_eq!(e.store().len(), 1);
}

#[test]
fn mouse_draws_like_pen() {
    let mut e = engine();
    e.on_pointer_down(mouse(1, 400.0, 300.0, 0));
    assert!(e.active_stroke().is_some());
}

// =============================================================
// Paper gating
// =============================================================

#[test]
fn stroke_off_paper_does_not_start() {
    let mut e = engine();
    // Screen (0, 0) is content (-200, -150): off the paper.
    let events = e.on_pointer_down(pen(1, 0.0, 0.0, 0));
    assert!(events.is_empty());
    assert!(e.active_stroke().is_none());
}

#[test]
fn moves_after_rejected_start_do_nothing() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 0.0, 0.0, 0));
    assert!(e.on_pointer_move(pen(1, 10.0, 10.0, 10)).is_empty());
    let up = e.on_pointer_up(pen(1, 10.0, 10.0, 20));
    assert!(completed(&up).is_none());
    assert!(e.store().is_empty());
}

#[test]
fn stroke_on_paper_edge_starts() {
    let mut e = engine();
    // Screen (200, 150) is content (0, 0): the paper corner.
    e.on_pointer_down(pen(1, 200.0, 150.0, 0));
    assert!(e.active_stroke().is_some());
}

#[test]
fn stroke_may_wander_off_paper_after_starting() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let events = e.on_pointer_move(pen(1, 0.0, 0.0, 10));
    assert!(has_stroke_updated(&events));
    assert_eq!(e.active_stroke().unwrap().points.len(), 2);
}

// =============================================================
// Touch pan
// =============================================================

#[test]
fn touch_pan_moves_the_viewport() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 400.0, 300.0, 0));
    let events = e.on_pointer_move(touch(1, 450.0, 300.0, 50));
    assert!(has_viewport_changed(&events));
    assert!(approx_eq(e.viewport().translate_x, 50.0));
}

#[test]
fn touch_pan_never_starts_a_stroke() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 400.0, 300.0, 0));
    e.on_pointer_move(touch(1, 500.0, 300.0, 50));
    e.on_pointer_up(touch(1, 500.0, 300.0, 60));
    assert!(e.active_stroke().is_none());
    assert!(e.store().is_empty());
}

#[test]
fn pan_deltas_accumulate_in_translate() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 100.0, 100.0, 0));
    e.on_pointer_move(touch(1, 150.0, 120.0, 20));
    e.on_pointer_move(touch(1, 170.0, 90.0, 40));
    assert!(approx_eq(e.viewport().translate_x, 70.0));
    assert!(approx_eq(e.viewport().translate_y, -10.0));
}

#[test]
fn touch_tap_emits_no_host_events() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 400.0, 300.0, 0));
    let events = e.on_pointer_up(touch(1, 402.0, 300.0, 80));
    assert!(events.is_empty());
    assert_eq!(e.viewport(), Viewport::default());
}

// =============================================================
// Pinch zoom
// =============================================================

#[test]
fn symmetric_pinch_doubles_scale_and_pins_midpoint() {
    let mut e = engine();
    let mid = Point::new(400.0, 300.0);
    let before = e.to_content(mid);

    e.on_pointer_down(touch(1, 300.0, 300.0, 0));
    e.on_pointer_down(touch(2, 500.0, 300.0, 10));
    e.on_pointer_move(touch(1, 200.0, 300.0, 20));
    e.on_pointer_move(touch(2, 600.0, 300.0, 30));

    assert!(approx_eq(e.viewport().scale, 2.0));
    assert!(point_approx_eq(e.to_content(mid), before));
}

#[test]
fn pinch_in_halves_scale() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 300.0, 300.0, 0));
    e.on_pointer_down(touch(2, 500.0, 300.0, 10));
    e.on_pointer_move(touch(1, 350.0, 300.0, 20));
    e.on_pointer_move(touch(2, 450.0, 300.0, 30));
    assert!(approx_eq(e.viewport().scale, 0.5));
}

#[test]
fn pinch_respects_scale_ceiling() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 390.0, 300.0, 0));
    e.on_pointer_down(touch(2, 410.0, 300.0, 10));
    // 20 px apart stretched to 400 px: raw ratio 20x, clamped to 3.0.
    e.on_pointer_move(touch(1, 200.0, 300.0, 20));
    e.on_pointer_move(touch(2, 600.0, 300.0, 30));
    assert!(approx_eq(e.viewport().scale, 3.0));
}

#[test]
fn pinch_works_in_pencil_mode() {
    let mut e = engine();
    assert_eq!(e.mode(), ToolMode::Pencil);
    e.on_pointer_down(touch(1, 300.0, 300.0, 0));
    e.on_pointer_down(touch(2, 500.0, 300.0, 10));
    e.on_pointer_move(touch(2, 700.0, 300.0, 20));
    assert!(e.viewport().scale > 1.0);
}

#[test]
fn two_finger_translate_pans_at_constant_scale() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 300.0, 300.0, 0));
    e.on_pointer_down(touch(2, 500.0, 300.0, 10));
    e.on_pointer_move(touch(1, 320.0, 310.0, 20));
    e.on_pointer_move(touch(2, 520.0, 310.0, 30));
    assert!(approx_eq(e.viewport().scale, 1.0));
    assert!(approx_eq(e.viewport().translate_x, 20.0));
    assert!(approx_eq(e.viewport().translate_y, 10.0));
}

// =============================================================
// Zoom-pan tool
// =============================================================

#[test]
fn zoom_mode_mouse_drag_pans() {
    let mut e = engine();
    e.set_mode(ToolMode::ZoomPan);
    e.on_pointer_down(mouse(1, 400.0, 300.0, 0));
    let events = e.on_pointer_move(mouse(1, 430.0, 280.0, 10));
    assert!(has_viewport_changed(&events));
    assert!(approx_eq(e.viewport().translate_x, 30.0));
    assert!(approx_eq(e.viewport().translate_y, -20.0));
    assert!(e.active_stroke().is_none());
}

#[test]
fn zoom_mode_drag_needs_no_threshold() {
    let mut e = engine();
    e.set_mode(ToolMode::ZoomPan);
    e.on_pointer_down(mouse(1, 400.0, 300.0, 0));
    let events = e.on_pointer_move(mouse(1, 401.0, 300.0, 5));
    assert!(has_viewport_changed(&events));
}

// =============================================================
// set_mode
// =============================================================

#[test]
fn set_mode_seals_active_stroke() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_move(pen(1, 420.0, 300.0, 10));
    let events = e.set_mode(ToolMode::ZoomPan);
    assert!(completed(&events).is_some());
    assert!(e.active_stroke().is_none());
    assert_eq!(e.store().len(), 1);
    assert_eq!(e.mode(), ToolMode::ZoomPan);
}

#[test]
fn set_mode_to_same_mode_is_quiet() {
    let mut e = engine();
    assert!(e.set_mode(ToolMode::Pencil).is_empty());
}

#[test]
fn set_mode_without_stroke_returns_no_events() {
    let mut e = engine();
    assert!(e.set_mode(ToolMode::ZoomPan).is_empty());
    assert!(e.set_mode(ToolMode::Pencil).is_empty());
}

// =============================================================
// Cancel
// =============================================================

#[test]
fn cancel_seals_stroke_without_update_events() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_move(pen(1, 420.0, 300.0, 10));
    let events = e.on_pointer_cancel(pen(1, 420.0, 300.0, 20));

    assert!(completed(&events).is_some());
    assert!(!has_stroke_updated(&events));
    assert!(e.active_stroke().is_none());
    assert_eq!(e.store().len(), 1);
    assert_eq!(e.gesture_name(), "idle");
}

#[test]
fn cancel_during_pan_leaves_viewport_as_is() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 100.0, 100.0, 0));
    e.on_pointer_move(touch(1, 150.0, 100.0, 10));
    let translate = e.viewport().translate_x;
    let events = e.on_pointer_cancel(touch(1, 150.0, 100.0, 20));
    assert!(events.is_empty());
    assert!(approx_eq(e.viewport().translate_x, translate));
    assert_eq!(e.gesture_name(), "idle");
}

// =============================================================
// resize
// =============================================================

#[test]
fn resize_recenters_and_reports() {
    let mut e = engine();
    e.on_pointer_down(touch(1, 100.0, 100.0, 0));
    e.on_pointer_move(touch(1, 150.0, 130.0, 10));
    e.on_pointer_up(touch(1, 150.0, 130.0, 20));

    let events = e.resize(1000.0, 800.0);
    assert!(has_viewport_changed(&events));
    assert!(has_render_needed(&events));
    assert_eq!(e.viewport().translate_x, 0.0);
    assert_eq!(e.viewport().translate_y, 0.0);
}

#[test]
fn resize_keeps_scale() {
    let mut e = engine();
    e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    let scale = e.viewport().scale;
    e.resize(1000.0, 800.0);
    assert!(approx_eq(e.viewport().scale, scale));
}

#[test]
fn resize_recenters_content() {
    let mut e = engine();
    e.resize(1000.0, 800.0);
    // New stage center for the 400x300 paper at scale 1.
    assert!(point_approx_eq(e.to_content(Point::new(500.0, 400.0)), Point::new(200.0, 150.0)));
}

// =============================================================
// set_zoom_limits
// =============================================================

#[test]
fn tightened_limits_reclamp_scale() {
    let mut e = engine();
    for _ in 0..40 {
        e.on_wheel(WheelDelta { dx: 0.0, dy: -120.0 }, Point::new(400.0, 300.0));
    }
    assert!(approx_eq(e.viewport().scale, 3.0));

    let events = e.set_zoom_limits(0.1, 2.0).unwrap();
    assert!(has_viewport_changed(&events));
    assert!(approx_eq(e.viewport().scale, 2.0));
}

#[test]
fn limits_within_range_report_nothing() {
    let mut e = engine();
    assert!(e.set_zoom_limits(0.5, 2.0).unwrap().is_empty());
}

#[test]
fn invalid_limits_are_rejected() {
    let mut e = engine();
    assert!(e.set_zoom_limits(0.0, 2.0).is_err());
    assert!(e.set_zoom_limits(2.0, 1.0).is_err());
}

// =============================================================
// Render pass
// =============================================================

#[test]
fn render_emits_transform_clip_and_polygons() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_up(pen(1, 400.0, 300.0, 10));

    let mut r = CountingRenderer::new();
    e.render(&mut r);
    assert_eq!(r.transforms, 1);
    assert_eq!(r.clips, vec![Rect::new(0.0, 0.0, 400.0, 300.0)]);
    assert_eq!(r.polygons, 1);
}

#[test]
fn render_includes_the_active_stroke() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));

    let mut r = CountingRenderer::new();
    e.render(&mut r);
    assert_eq!(r.polygons, 1);
}

#[test]
fn render_of_empty_engine_draws_no_polygons() {
    let e = engine();
    let mut r = CountingRenderer::new();
    e.render(&mut r);
    assert_eq!(r.polygons, 0);
}

// =============================================================
// Debug sink
// =============================================================

#[test]
fn sink_sees_gesture_transitions() {
    let sink = RecordingSink::default();
    let events = sink.0.clone();
    let mut e = EngineCore::new(800.0, 600.0, config()).unwrap()
        .with_debug_sink(Box::new(sink));

    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_up(pen(1, 400.0, 300.0, 10));

    let recorded = events.borrow();
    assert!(recorded.contains(&DebugEvent::GestureTransition { from: "idle", to: "stroking" }));
    assert!(recorded.contains(&DebugEvent::GestureTransition { from: "stroking", to: "idle" }));
}

#[test]
fn sink_sees_rejected_stroke_starts() {
    let sink = RecordingSink::default();
    let events = sink.0.clone();
    let mut e = EngineCore::new(800.0, 600.0, config()).unwrap()
        .with_debug_sink(Box::new(sink));

    e.on_pointer_down(pen(1, 0.0, 0.0, 0));
    let recorded = events.borrow();
    assert!(recorded.iter().any(|d| matches!(d, DebugEvent::StrokeRejected { .. })));
}

#[test]
fn engine_without_sink_works_fine() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    e.on_pointer_up(pen(1, 400.0, 300.0, 10));
    assert_eq!(e.store().len(), 1);
}

// =============================================================
// Event wire shape
// =============================================================

#[test]
fn render_needed_serializes_to_tagged_json() {
    let json = serde_json::to_string(&EngineEvent::RenderNeeded).unwrap();
    assert_eq!(json, r#"{"event":"render_needed"}"#);
}

#[test]
fn viewport_changed_carries_viewport_fields() {
    let event = EngineEvent::ViewportChanged { viewport: Viewport::default() };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains(r#""event":"viewport_changed""#));
    assert!(json.contains(r#""scale":1.0"#));
    assert!(json.contains("translate_x"));
}

#[test]
fn stroke_completed_carries_id_and_primitives() {
    let mut e = engine();
    e.on_pointer_down(pen(1, 400.0, 300.0, 0));
    let events = e.on_pointer_up(pen(1, 400.0, 300.0, 10));
    let completed = events
        .iter()
        .find(|ev| matches!(ev, EngineEvent::StrokeCompleted { .. }))
        .unwrap();
    let json = serde_json::to_string(completed).unwrap();
    assert!(json.contains(r#""event":"stroke_completed""#));
    assert!(json.contains(r#""kind":"disc""#));
}
