//! Pointer input model: samples, device kinds, wheel deltas, and the table of
//! concurrently-down pointers.
//!
//! These are the raw-event types the host feeds into the engine. The gesture
//! state machine consumes them; nothing else writes [`ActivePointers`].

#[cfg(test)]
#[path = "pointer_test.rs"]
mod pointer_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// The device class that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

impl PointerKind {
    /// Whether this device draws strokes directly (mouse and pen do; touch
    /// pans and zooms).
    #[must_use]
    pub fn draws(self) -> bool {
        matches!(self, Self::Mouse | Self::Pen)
    }
}

/// One pointer event as reported by the host, in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointerSample {
    /// Host-assigned pointer id, stable for the lifetime of the contact.
    pub id: i64,
    /// Screen-space x in pixels.
    pub x: f64,
    /// Screen-space y in pixels.
    pub y: f64,
    /// Normalized contact pressure in `[0, 1]`.
    pub pressure: f64,
    /// Device class.
    pub kind: PointerKind,
    /// Host clock timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl PointerSample {
    /// The sample position as a screen-space point.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Wheel / trackpad scroll delta in pixels (positive `dy` = down).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Last known sample for every pointer currently down.
///
/// Insertion order is preserved so pinch math always sees the same two
/// pointers in the same order. Removing an unknown id is a no-op.
#[derive(Debug, Default)]
pub struct ActivePointers {
    samples: HashMap<i64, PointerSample>,
    order: Vec<i64>,
}

impl ActivePointers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer-down (or refresh an already-tracked pointer).
    pub fn insert(&mut self, sample: PointerSample) {
        if self.samples.insert(sample.id, sample).is_none() {
            self.order.push(sample.id);
        }
    }

    /// Update the last known sample for a tracked pointer. Returns `false`
    /// (and records nothing) for an untracked id.
    pub fn update(&mut self, sample: PointerSample) -> bool {
        match self.samples.get_mut(&sample.id) {
            Some(slot) => {
                *slot = sample;
                true
            }
            None => false,
        }
    }

    /// Forget a pointer on up/cancel. Unknown ids are ignored.
    pub fn remove(&mut self, id: i64) -> Option<PointerSample> {
        let removed = self.samples.remove(&id);
        if removed.is_some() {
            self.order.retain(|&tracked| tracked != id);
        }
        removed
    }

    /// Last known sample for `id`, if tracked.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&PointerSample> {
        self.samples.get(&id)
    }

    /// Whether `id` is currently tracked.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.samples.contains_key(&id)
    }

    /// Number of pointers currently down.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no pointer is down.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The two earliest still-down pointers, in the order they went down.
    /// `None` unless at least two pointers are tracked.
    #[must_use]
    pub fn first_two(&self) -> Option<(PointerSample, PointerSample)> {
        let first = self.order.first().and_then(|id| self.samples.get(id))?;
        let second = self.order.get(1).and_then(|id| self.samples.get(id))?;
        Some((*first, *second))
    }

    /// The earliest still-down pointer, if any.
    #[must_use]
    pub fn first(&self) -> Option<PointerSample> {
        self.order.first().and_then(|id| self.samples.get(id)).copied()
    }

    /// The two earliest still-down touch pointers, skipping mouse/pen.
    /// Pinch math is fed from these; `None` unless two touches are down.
    #[must_use]
    pub fn first_two_touches(&self) -> Option<(PointerSample, PointerSample)> {
        let mut touches = self
            .order
            .iter()
            .filter_map(|id| self.samples.get(id))
            .filter(|s| s.kind == PointerKind::Touch);
        let first = touches.next()?;
        let second = touches.next()?;
        Some((*first, *second))
    }

    /// The earliest still-down touch pointer, if any.
    #[must_use]
    pub fn first_touch(&self) -> Option<PointerSample> {
        self.order
            .iter()
            .filter_map(|id| self.samples.get(id))
            .find(|s| s.kind == PointerKind::Touch)
            .copied()
    }

    /// Drop all tracked pointers.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.order.clear();
    }
}
