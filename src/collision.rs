//! Segment vs. axis-aligned rectangle collision.
//!
//! Liang–Barsky clipping against the *open* rectangle: a movement counts as a
//! crossing only when a positive-length part of it lies strictly inside the
//! tile. Grazing an edge or touching a corner never counts.

use crate::types::{Point, Rect};

/// Parametric tolerance used to reject degenerate clips from rounding.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct Collision;

impl Collision {
    pub fn new() -> Self {
        Self
    }

    /// Does the segment `start → end` pass through the interior of `rect`?
    pub fn intersects(&self, start: Point, end: Point, rect: &Rect) -> bool {
        self.entry(start, end, rect).is_some()
    }

    /// Segment parameter `t ∈ [0, 1]` at which the segment enters the
    /// interior of `rect`, or `None` when it never does.
    ///
    /// Returns `Some(0.0)` for a segment that starts inside the rectangle.
    pub fn entry(&self, start: Point, end: Point, rect: &Rect) -> Option<f64> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx.abs() < EPSILON && dy.abs() < EPSILON {
            return None;
        }

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        // (p, q) pairs for the left, right, top and bottom edges.
        let edges = [
            (-dx, start.x - rect.x),
            (dx, rect.max_x() - start.x),
            (-dy, start.y - rect.y),
            (dy, rect.max_y() - start.y),
        ];

        for (p, q) in edges {
            if p.abs() < EPSILON {
                // Parallel to this edge: must lie strictly inside the slab.
                if q <= EPSILON {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        if t1 - t0 > EPSILON {
            Some(t0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Rect {
        Rect::from_extents(50.0, 150.0, -10.0, 10.0)
    }

    #[test]
    fn straight_crossing_enters_at_left_edge() {
        let t = Collision::new()
            .entry(Point::new(0.0, 0.0), Point::new(200.0, 0.0), &tile())
            .unwrap();
        assert!((t - 0.25).abs() < 1e-12);
    }

    #[test]
    fn start_inside_enters_at_zero() {
        let t = Collision::new().entry(Point::new(100.0, 0.0), Point::new(300.0, 0.0), &tile());
        assert_eq!(t, Some(0.0));
    }

    #[test]
    fn corner_touch_is_not_a_crossing() {
        // Passes exactly through the (150, 10) corner from outside.
        let c = Collision::new();
        assert!(!c.intersects(Point::new(140.0, 20.0), Point::new(160.0, 0.0), &tile()));
    }
}
