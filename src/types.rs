//! Core scene types shared across all modules.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Document id of a tile.
    TileId
);
string_id!(
    /// Document id of a token.
    TokenId
);
string_id!(
    /// Document id of a scene.
    SceneId
);
string_id!(
    /// Session user id.
    UserId
);
string_id!(
    /// Macro registry id.
    MacroId
);

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// A point in scene pixel space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation along the segment `self → to`.
    pub fn lerp(self, to: Point, t: f64) -> Point {
        Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Axis-aligned rectangle; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive extents, e.g. `x∈[50,150], y∈[-10,10]`.
    pub fn from_extents(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

// ---------------------------------------------------------------------------
// Tile flags
// ---------------------------------------------------------------------------

/// Reaction icon selector persisted on the tile as `0|1|2|3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimType {
    #[default]
    None,
    Info,
    Question,
    Exclamation,
}

impl AnimType {
    pub fn as_u8(self) -> u8 {
        match self {
            AnimType::None => 0,
            AnimType::Info => 1,
            AnimType::Question => 2,
            AnimType::Exclamation => 3,
        }
    }

    /// Unknown selectors fall back to `None` rather than failing the tile.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AnimType::Info,
            2 => AnimType::Question,
            3 => AnimType::Exclamation,
            _ => AnimType::None,
        }
    }
}

impl Serialize for AnimType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for AnimType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Ok(AnimType::from_u8(value))
    }
}

/// Namespaced flags persisted on every trip tile.
///
/// Wire shape: `{ enabled, triggered, animType, macroId: string|0, unlimited }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileFlags {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub anim_type: AnimType,
    #[serde(
        default,
        serialize_with = "macro_ref::serialize",
        deserialize_with = "macro_ref::deserialize"
    )]
    pub macro_id: Option<MacroId>,
    /// Fires on every crossing; never stays consumed.
    #[serde(default)]
    pub unlimited: bool,
}

impl TileFlags {
    /// Whether a crossing of this tile should produce a trigger right now.
    pub fn can_fire(&self) -> bool {
        self.enabled && (!self.triggered || self.unlimited)
    }
}

impl Default for TileFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            triggered: false,
            anim_type: AnimType::None,
            macro_id: None,
            unlimited: false,
        }
    }
}

/// `macroId` is either a macro id string or the number `0` for "no macro".
mod macro_ref {
    use super::MacroId;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(String),
        Number(i64),
        Null,
    }

    pub fn serialize<S: Serializer>(value: &Option<MacroId>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => s.serialize_str(id.as_str()),
            None => s.serialize_u8(0),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MacroId>, D::Error> {
        Ok(match Raw::deserialize(d)? {
            Raw::Id(id) if !id.is_empty() && id != "0" => Some(MacroId(id)),
            _ => None,
        })
    }
}

/// Partial update of [`TileFlags`]; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileFlagsPatch {
    pub enabled: Option<bool>,
    pub triggered: Option<bool>,
    pub anim_type: Option<AnimType>,
    pub macro_id: Option<Option<MacroId>>,
    pub unlimited: Option<bool>,
}

impl TileFlagsPatch {
    pub fn triggered(value: bool) -> Self {
        Self {
            triggered: Some(value),
            ..Default::default()
        }
    }

    pub fn apply(&self, flags: &mut TileFlags) {
        if let Some(v) = self.enabled {
            flags.enabled = v;
        }
        if let Some(v) = self.triggered {
            flags.triggered = v;
        }
        if let Some(v) = self.anim_type {
            flags.anim_type = v;
        }
        if let Some(v) = &self.macro_id {
            flags.macro_id = v.clone();
        }
        if let Some(v) = self.unlimited {
            flags.unlimited = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Scene documents
// ---------------------------------------------------------------------------

/// A tile document. Only tiles carrying [`TileFlags`] are trip tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub scene_id: SceneId,
    pub bounds: Rect,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub texture: String,
    /// Insertion order within the scene.
    #[serde(default)]
    pub sort: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<TileFlags>,
}

impl Tile {
    pub fn is_trip_tile(&self) -> bool {
        self.flags.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.as_ref().is_some_and(|f| f.enabled)
    }

    pub fn is_triggered(&self) -> bool {
        self.flags.as_ref().is_some_and(|f| f.triggered)
    }

    pub fn is_unlimited(&self) -> bool {
        self.flags.as_ref().is_some_and(|f| f.unlimited)
    }

    pub fn can_fire(&self) -> bool {
        self.flags.as_ref().is_some_and(TileFlags::can_fire)
    }

    pub fn origin(&self) -> Point {
        self.bounds.origin()
    }
}

/// Token disposition, ordered as the host persists it (`-2..=1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Secret,
    Hostile,
    #[default]
    Neutral,
    Friendly,
}

/// A token document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub scene_id: SceneId,
    pub x: f64,
    pub y: f64,
    /// Footprint in grid units.
    #[serde(default = "one")]
    pub width: f64,
    #[serde(default = "one")]
    pub height: f64,
    #[serde(default)]
    pub disposition: Disposition,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub owner: Option<UserId>,
    /// Document revision, bumped by the store on every committed write.
    /// Every client sees the same value for the same update.
    #[serde(default)]
    pub revision: u64,
}

fn one() -> f64 {
    1.0
}

impl Token {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Where a token position write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Ordinary movement by a user.
    #[default]
    User,
    /// Position snap written by a trigger execution.
    TriggerSnap,
}

/// The committed change set of a token update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenChange {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub hidden: Option<bool>,
    #[serde(default)]
    pub origin: ChangeOrigin,
}

impl TokenChange {
    pub fn movement(to: Point) -> Self {
        Self {
            x: Some(to.x),
            y: Some(to.y),
            ..Default::default()
        }
    }

    pub fn is_positional(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}
