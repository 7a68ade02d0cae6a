//! Derived token geometry (pixel footprint, centre, reaction anchor).

use crate::types::{Point, Rect, Token};

#[derive(Debug, Clone, Copy)]
pub struct TokenCalculator {
    /// Pixels the reaction anchor sits above the token's top edge.
    offset: f64,
}

impl TokenCalculator {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    /// Token footprint in pixels for a scene with `grid_size` px cells.
    pub fn footprint(&self, token: &Token, grid_size: f64) -> Rect {
        Rect::new(
            token.x,
            token.y,
            token.width * grid_size,
            token.height * grid_size,
        )
    }

    pub fn center(&self, token: &Token, grid_size: f64) -> Point {
        let r = self.footprint(token, grid_size);
        Point::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
    }

    /// Horizontally centred, just above the top edge.
    pub fn reaction_anchor(&self, token: &Token, grid_size: f64) -> Point {
        let r = self.footprint(token, grid_size);
        Point::new(r.x + r.width / 2.0, r.y - self.offset)
    }
}

impl Default for TokenCalculator {
    fn default() -> Self {
        Self::new(0.0)
    }
}
