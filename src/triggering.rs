//! TriggeringHandler – decides which trip tile (if any) a movement fired.
//!
//! Detection is kept separate from mutation: nothing in here writes the
//! `triggered` flag. The authority flips it later in
//! [`PostTriggerActions`](crate::post_trigger::PostTriggerActions).

use crate::collision::Collision;
use crate::types::{Point, Tile};
use log::debug;

/// A crossing that should fire.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerHit {
    pub tile: Tile,
    /// Segment parameter at which the tile was entered.
    pub entry: f64,
    /// Scene-space point where the movement entered the tile.
    pub crossing: Point,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriggeringHandler {
    collision: Collision,
}

impl TriggeringHandler {
    pub fn new(collision: Collision) -> Self {
        Self { collision }
    }

    /// Find the tile crossed first by the movement `before → after`.
    ///
    /// Among intersecting enabled trip tiles the earliest entry wins; ties go
    /// to the lowest `sort`, then to the earlier candidate. If the winner is
    /// already consumed (and not unlimited) the crossing produces nothing.
    pub fn find_triggered_tile(
        &self,
        before: Point,
        after: Point,
        candidates: &[Tile],
    ) -> Option<TriggerHit> {
        let (_, entry, winner) = candidates
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_enabled())
            .filter_map(|(idx, tile)| {
                self.collision
                    .entry(before, after, &tile.bounds)
                    .map(|t| (idx, t, tile))
            })
            .min_by(|(ia, ta, a), (ib, tb, b)| {
                ta.total_cmp(tb)
                    .then(a.sort.cmp(&b.sort))
                    .then(ia.cmp(ib))
            })?;

        if !winner.can_fire() {
            debug!("Tile {} crossed but already triggered", winner.id);
            return None;
        }

        Some(TriggerHit {
            tile: winner.clone(),
            entry,
            crossing: before.lerp(after, entry),
        })
    }
}
