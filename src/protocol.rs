//! Socket wire protocol.
//!
//! This module owns **every message that crosses the socket boundary**
//! between clients of one session.
//!
//! | Message            | Direction              | Purpose                        |
//! |--------------------|------------------------|--------------------------------|
//! | `REQUEST_TRIGGER`  | any client → authority | ask the GM to fire a tile      |
//! | `TRIGGER_EXECUTED` | authority → all        | advisory acknowledgement only  |
//!
//! ## Design rules
//!
//! 1. Every message is JSON with a `type` tag and camelCase fields.
//! 2. Every message travels inside a [`SocketEnvelope`] naming the scene and
//!    the sender, so stale scenes and echoes can be filtered.
//! 3. The `triggered` flag is never carried here – clients learn it from the
//!    document sync channel, which stays the source of truth.

use crate::types::{Point, SceneId, TileId, TokenId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketEnvelope {
    pub scene: SceneId,
    pub sender: UserId,
    pub message: SocketMessage,
}

impl SocketEnvelope {
    pub fn new(scene: SceneId, sender: UserId, message: SocketMessage) -> Self {
        Self {
            scene,
            sender,
            message,
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketMessage {
    RequestTrigger(TriggerRequest),
    TriggerExecuted(TriggerExecuted),
}

/// A client detected a crossing and asks the authority to fire the tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub tile_id: TileId,
    pub token_id: TokenId,
    /// Where the movement entered the tile.
    pub x: f64,
    pub y: f64,
    /// Revision of the token update that produced the crossing. Every
    /// client detecting the same move reports the same value, so with the
    /// tile and token it identifies the move.
    pub revision: u64,
}

impl TriggerRequest {
    pub fn crossing(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The authority finished running the post-trigger actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerExecuted {
    pub tile_id: TileId,
    pub token_id: TokenId,
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// Bus subjects used by the protocol.
pub mod subjects {
    /// Single module socket shared by every scene; envelopes carry the scene.
    pub const MODULE_SOCKET: &str = "module.tripwire";
}
