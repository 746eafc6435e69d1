//! The paper: the fixed-size drawing area inside the infinite table.
//!
//! Strokes may only start inside the paper; the render pass clips ink to it.
//! Coordinates here are content-space — pan and zoom never move the paper.

#[cfg(test)]
#[path = "paper_test.rs"]
mod paper_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Fixed drawing area with its origin at content `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub width: f64,
    pub height: f64,
}

impl Paper {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether a content-space point falls on the paper. Edges count.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        self.rect().contains(p)
    }

    /// The paper as a content-space rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
