//! Trip-tile authoring rules applied by the document store on tile writes.
//!
//! The authoring UI itself lives outside this crate; these are the
//! invariants every trip-tile write must satisfy regardless of who wrote it.

use crate::types::{AnimType, MacroId, Rect, SceneId, Tile, TileFlags, TileId};

/// Texture shown to the GM while a tile is armed.
pub const TILE_ARMED_TEXTURE: &str = "modules/tripwire/img/tile-armed.png";
/// Texture shown to the GM once a one-shot tile has fired.
pub const TILE_SPRUNG_TEXTURE: &str = "modules/tripwire/img/tile-sprung.png";

/// Authoring request for a new trip tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TripTileSpec {
    pub id: TileId,
    pub scene_id: SceneId,
    pub bounds: Rect,
    pub anim_type: AnimType,
    pub macro_id: Option<MacroId>,
    pub unlimited: bool,
}

/// Build a freshly authored trip tile: enabled, armed, hidden from players.
pub fn create_trip_tile(spec: TripTileSpec, sort: u32) -> Tile {
    let mut tile = Tile {
        id: spec.id,
        scene_id: spec.scene_id,
        bounds: spec.bounds,
        rotation: 0.0,
        hidden: true,
        texture: String::new(),
        sort,
        flags: Some(TileFlags {
            enabled: true,
            triggered: false,
            anim_type: spec.anim_type,
            macro_id: spec.macro_id,
            unlimited: spec.unlimited,
        }),
    };
    normalize_tile(&mut tile);
    tile
}

/// Re-apply trip-tile invariants after a write. Ordinary tiles are untouched.
///
/// Trip tiles never rotate (collision assumes axis alignment), stay hidden,
/// and show the sprung texture only while a one-shot tile is consumed.
pub fn normalize_tile(tile: &mut Tile) {
    let Some(flags) = &tile.flags else {
        return;
    };
    if !flags.enabled {
        return;
    }

    tile.rotation = 0.0;
    tile.hidden = true;
    tile.texture = if flags.triggered && !flags.unlimited {
        TILE_SPRUNG_TEXTURE.to_string()
    } else {
        TILE_ARMED_TEXTURE.to_string()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileFlagsPatch;

    fn spec(unlimited: bool) -> TripTileSpec {
        TripTileSpec {
            id: TileId::new("tile"),
            scene_id: SceneId::new("scene"),
            bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
            anim_type: AnimType::Info,
            macro_id: None,
            unlimited,
        }
    }

    #[test]
    fn new_tiles_are_armed_and_hidden() {
        let tile = create_trip_tile(spec(false), 0);
        assert!(tile.hidden);
        assert!(tile.can_fire());
        assert_eq!(tile.texture, TILE_ARMED_TEXTURE);
    }

    #[test]
    fn rotation_is_reset_and_texture_tracks_triggered() {
        let mut tile = create_trip_tile(spec(false), 0);
        tile.rotation = 45.0;
        if let Some(flags) = tile.flags.as_mut() {
            TileFlagsPatch::triggered(true).apply(flags);
        }
        normalize_tile(&mut tile);
        assert_eq!(tile.rotation, 0.0);
        assert_eq!(tile.texture, TILE_SPRUNG_TEXTURE);
    }

    #[test]
    fn unlimited_tiles_always_look_armed() {
        let mut tile = create_trip_tile(spec(true), 0);
        if let Some(flags) = tile.flags.as_mut() {
            flags.triggered = true;
        }
        normalize_tile(&mut tile);
        assert_eq!(tile.texture, TILE_ARMED_TEXTURE);
    }
}
