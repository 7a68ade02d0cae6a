//! Document store boundary.
//!
//! The host owns tile and token documents and syncs them to every client.
//! [`DocumentStore`] is the slice of that API the trigger pipeline needs;
//! [`MemoryStore`] is an in-process implementation used by the authority
//! peer binary and by tests.

use crate::authoring::{self, TripTileSpec};
use crate::error::{Result, TripwireError};
use crate::types::{
    ChangeOrigin, Point, SceneId, Tile, TileFlagsPatch, TileId, Token, TokenChange, TokenId,
};
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn tile(&self, id: &TileId) -> Result<Option<Tile>>;

    async fn token(&self, id: &TokenId) -> Result<Option<Token>>;

    /// All tiles of a scene, in insertion order.
    async fn scene_tiles(&self, scene: &SceneId) -> Result<Vec<Tile>>;

    /// Write a token position. Resolves once the write is committed.
    async fn update_token_position(
        &self,
        id: &TokenId,
        to: Point,
        origin: ChangeOrigin,
    ) -> Result<Token>;

    /// Patch a tile's namespaced flags. Resolves once the write is committed.
    async fn patch_tile_flags(&self, id: &TileId, patch: TileFlagsPatch) -> Result<Tile>;
}

// ---------------------------------------------------------------------------
// Sync events
// ---------------------------------------------------------------------------

/// Committed change, as delivered to every client by the sync channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DocumentEvent {
    TileCreated {
        tile: Tile,
    },
    TileUpdated {
        tile: Tile,
        patch: TileFlagsPatch,
    },
    TokenCreated {
        token: Token,
    },
    TokenUpdated {
        before: Token,
        after: Token,
        change: TokenChange,
    },
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Scene seed file layout used by [`MemoryStore::load_scene`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocuments {
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

#[derive(Default)]
struct Documents {
    tiles: HashMap<TileId, Tile>,
    tokens: HashMap<TokenId, Token>,
    next_sort: u32,
}

/// Writes are serialised behind one lock, like a server-side document store.
pub struct MemoryStore {
    docs: RwLock<Documents>,
    events: broadcast::Sender<DocumentEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            docs: RwLock::new(Documents::default()),
            events,
        }
    }

    /// Receive every committed change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    pub fn load_scene(&self, scene: SceneDocuments) {
        for tile in scene.tiles {
            self.insert_tile(tile);
        }
        for token in scene.tokens {
            self.insert_token(token);
        }
    }

    /// Insert an existing tile document, keeping its `sort` if it is later
    /// than anything seen so far.
    pub fn insert_tile(&self, mut tile: Tile) -> Tile {
        authoring::normalize_tile(&mut tile);
        {
            let mut docs = self.docs.write();
            docs.next_sort = docs.next_sort.max(tile.sort + 1);
            docs.tiles.insert(tile.id.clone(), tile.clone());
        }
        self.publish(DocumentEvent::TileCreated { tile: tile.clone() });
        tile
    }

    /// Author a new trip tile at the end of the scene's insertion order.
    pub fn create_trip_tile(&self, spec: TripTileSpec) -> Tile {
        let tile = {
            let mut docs = self.docs.write();
            let sort = docs.next_sort;
            docs.next_sort += 1;
            let tile = authoring::create_trip_tile(spec, sort);
            docs.tiles.insert(tile.id.clone(), tile.clone());
            tile
        };
        self.publish(DocumentEvent::TileCreated { tile: tile.clone() });
        tile
    }

    pub fn insert_token(&self, token: Token) -> Token {
        self.docs
            .write()
            .tokens
            .insert(token.id.clone(), token.clone());
        self.publish(DocumentEvent::TokenCreated {
            token: token.clone(),
        });
        token
    }

    /// Commit a user movement and return `(before, after, change)`.
    pub fn move_token(&self, id: &TokenId, to: Point) -> Result<(Token, Token, TokenChange)> {
        self.write_position(id, to, ChangeOrigin::User)
    }

    pub fn tile_now(&self, id: &TileId) -> Option<Tile> {
        self.docs.read().tiles.get(id).cloned()
    }

    pub fn token_now(&self, id: &TokenId) -> Option<Token> {
        self.docs.read().tokens.get(id).cloned()
    }

    fn write_position(
        &self,
        id: &TokenId,
        to: Point,
        origin: ChangeOrigin,
    ) -> Result<(Token, Token, TokenChange)> {
        let change = TokenChange {
            origin,
            ..TokenChange::movement(to)
        };
        let (before, after) = {
            let mut docs = self.docs.write();
            let token = docs
                .tokens
                .get_mut(id)
                .ok_or_else(|| TripwireError::token_not_found(id))?;
            let before = token.clone();
            token.x = to.x;
            token.y = to.y;
            token.revision += 1;
            (before, token.clone())
        };

        debug!("Token {} moved {} -> {} ({:?})", id, before.position(), to, origin);
        self.publish(DocumentEvent::TokenUpdated {
            before: before.clone(),
            after: after.clone(),
            change: change.clone(),
        });
        Ok((before, after, change))
    }

    fn publish(&self, event: DocumentEvent) {
        // No subscribers is fine; the store is still the source of truth.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn tile(&self, id: &TileId) -> Result<Option<Tile>> {
        Ok(self.tile_now(id))
    }

    async fn token(&self, id: &TokenId) -> Result<Option<Token>> {
        Ok(self.token_now(id))
    }

    async fn scene_tiles(&self, scene: &SceneId) -> Result<Vec<Tile>> {
        let docs = self.docs.read();
        let mut tiles: Vec<Tile> = docs
            .tiles
            .values()
            .filter(|t| &t.scene_id == scene)
            .cloned()
            .collect();
        tiles.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.id.cmp(&b.id)));
        Ok(tiles)
    }

    async fn update_token_position(
        &self,
        id: &TokenId,
        to: Point,
        origin: ChangeOrigin,
    ) -> Result<Token> {
        self.write_position(id, to, origin).map(|(_, after, _)| after)
    }

    async fn patch_tile_flags(&self, id: &TileId, patch: TileFlagsPatch) -> Result<Tile> {
        let tile = {
            let mut docs = self.docs.write();
            let tile = docs
                .tiles
                .get_mut(id)
                .ok_or_else(|| TripwireError::tile_not_found(id))?;
            let flags = tile
                .flags
                .as_mut()
                .ok_or_else(|| TripwireError::Store(format!("tile {} is not a trip tile", id)))?;
            patch.apply(flags);
            authoring::normalize_tile(tile);
            tile.clone()
        };

        self.publish(DocumentEvent::TileUpdated {
            tile: tile.clone(),
            patch,
        });
        Ok(tile)
    }
}
