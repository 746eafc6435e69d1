//! Rendering: the backend capability trait and the read-only scene pass.
//!
//! The engine is written once against [`Renderer`]; each rendering backend
//! supplies an adapter implementing its three capabilities. The scene pass
//! receives read-only views of engine state and emits draw calls — it never
//! mutates anything.
//!
//! Draw order: backend transform from the viewport, clip to the paper, sealed
//! strokes oldest-first, then the in-progress stroke on top.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::TAU;

use crate::consts::DISC_SEGMENTS;
use crate::geometry::{Point, Rect};
use crate::paper::Paper;
use crate::store::StrokeStore;
use crate::stroke::{Primitive, Stroke, StrokeStyle, tessellate};
use crate::viewport::ViewportTransform;

/// The capabilities a rendering backend must supply.
///
/// Coordinates handed to `draw_polygon` are in content space; the backend is
/// expected to apply the transform installed by `set_transform`
/// (`screen = content * scale + offset`).
pub trait Renderer {
    /// Install the content-to-screen transform for subsequent draw calls.
    fn set_transform(&mut self, scale: f64, offset_x: f64, offset_y: f64);
    /// Restrict subsequent draw calls to a content-space rectangle.
    fn clip_rect(&mut self, rect: Rect);
    /// Fill a closed polygon given in content-space vertices.
    fn draw_polygon(&mut self, vertices: &[Point]);
}

/// Draw the full scene.
pub fn draw(
    renderer: &mut dyn Renderer,
    viewport: &ViewportTransform,
    paper: &Paper,
    store: &StrokeStore,
    active: Option<&Stroke>,
    style: &StrokeStyle,
) {
    let origin = viewport.content_origin();
    renderer.set_transform(viewport.scale(), origin.x, origin.y);
    renderer.clip_rect(paper.rect());

    for stroke in store.in_draw_order() {
        draw_primitives(renderer, &tessellate(&stroke.points, style));
    }
    if let Some(stroke) = active {
        draw_primitives(renderer, &tessellate(&stroke.points, style));
    }
}

fn draw_primitives(renderer: &mut dyn Renderer, primitives: &[Primitive]) {
    for primitive in primitives {
        match primitive {
            Primitive::Quad { vertices } => renderer.draw_polygon(vertices),
            Primitive::Disc { center, radius } => {
                renderer.draw_polygon(&disc_polygon(*center, *radius));
            }
        }
    }
}

/// Approximate a disc with a fixed-segment polygon fan.
#[allow(clippy::cast_precision_loss)]
fn disc_polygon(center: Point, radius: f64) -> Vec<Point> {
    let step = TAU / DISC_SEGMENTS as f64;
    (0..DISC_SEGMENTS)
        .map(|i| {
            let angle = step * i as f64;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}
