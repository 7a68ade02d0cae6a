//! Recording host services shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tripwire::{
    animation::{Frame, RenderLayer, SpriteId},
    authoring::TripTileSpec,
    config::ReactionConfig,
    game::{Camera, SessionClock},
    macros::MacroRegistry,
    protocol::{SocketEnvelope, SocketMessage, TriggerRequest},
    AnimType, Collaborators, Disposition, DocumentEvent, MacroId, MemoryStore, Point, Rect,
    SceneContext, SceneId, SocketChannel, SocketController, StaticAuthority, Tile, TileId, Token,
    TokenId, TripwireConfig, TripwireError, TripwireModule, UserId,
};

pub const SCENE: &str = "scene-1";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingCamera {
    pub pans: Mutex<Vec<Point>>,
}

#[async_trait]
impl Camera for RecordingCamera {
    async fn pan_to(&self, to: Point) {
        self.pans.lock().push(to);
    }
}

#[derive(Default)]
pub struct RecordingClock {
    pub pauses: AtomicUsize,
}

#[async_trait]
impl SessionClock for RecordingClock {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Macro registry that knows a fixed set of ids and can be told to fail.
#[derive(Default)]
pub struct RecordingMacros {
    pub known: HashSet<MacroId>,
    pub fail: bool,
    pub runs: Mutex<Vec<(MacroId, TokenId)>>,
}

impl RecordingMacros {
    pub fn with(ids: &[&str]) -> Self {
        Self {
            known: ids.iter().map(|id| MacroId::new(*id)).collect(),
            ..Default::default()
        }
    }

    pub fn failing(ids: &[&str]) -> Self {
        Self {
            fail: true,
            ..Self::with(ids)
        }
    }
}

#[async_trait]
impl MacroRegistry for RecordingMacros {
    fn contains(&self, id: &MacroId) -> bool {
        self.known.contains(id)
    }

    async fn execute(&self, id: &MacroId, token: &Token) -> Result<(), TripwireError> {
        self.runs.lock().push((id.clone(), token.id.clone()));
        if self.fail {
            return Err(TripwireError::Macro {
                id: id.to_string(),
                reason: "boom".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLayer {
    next: AtomicU64,
    pub spawned: Mutex<Vec<(String, Point, f64)>>,
    pub removed: Mutex<Vec<SpriteId>>,
}

impl RenderLayer for RecordingLayer {
    fn spawn_sprite(&self, asset: &str, anchor: Point, size: f64) -> SpriteId {
        self.spawned.lock().push((asset.to_string(), anchor, size));
        SpriteId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn update_sprite(&self, _sprite: SpriteId, _frame: Frame) {}

    fn remove_sprite(&self, sprite: SpriteId) {
        self.removed.lock().push(sprite);
    }
}

// ---------------------------------------------------------------------------
// One client's view of a session
// ---------------------------------------------------------------------------

pub struct Client {
    pub store: Arc<MemoryStore>,
    pub authority: Arc<StaticAuthority>,
    pub camera: Arc<RecordingCamera>,
    pub clock: Arc<RecordingClock>,
    pub macros: Arc<RecordingMacros>,
    pub layer: Arc<RecordingLayer>,
}

impl Client {
    pub fn new(store: Arc<MemoryStore>, authority: StaticAuthority, macros: RecordingMacros) -> Self {
        Self {
            store,
            authority: Arc::new(authority),
            camera: Arc::new(RecordingCamera::default()),
            clock: Arc::new(RecordingClock::default()),
            macros: Arc::new(macros),
            layer: Arc::new(RecordingLayer::default()),
        }
    }

    pub fn gm(store: Arc<MemoryStore>) -> Self {
        Self::new(store, StaticAuthority::gm("gm"), RecordingMacros::default())
    }

    pub fn player(store: Arc<MemoryStore>, user: &str) -> Self {
        Self::new(store, StaticAuthority::player(user), RecordingMacros::default())
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.store.clone(),
            authority: self.authority.clone(),
            camera: self.camera.clone(),
            clock: self.clock.clone(),
            macros: self.macros.clone(),
        }
    }

    pub fn scene(&self) -> SceneContext {
        SceneContext::new(SceneId::new(SCENE), 100.0, self.layer.clone())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Short reaction timings so spawned animations finish quickly.
pub fn fast_config() -> TripwireConfig {
    TripwireConfig {
        reaction: ReactionConfig {
            appear_ms: 10,
            hold_ms: 10,
            fade_ms: 10,
            frame_ms: 5,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn trip_spec(id: &str, bounds: Rect) -> TripTileSpec {
    TripTileSpec {
        id: TileId::new(id),
        scene_id: SceneId::new(SCENE),
        bounds,
        anim_type: AnimType::Exclamation,
        macro_id: None,
        unlimited: false,
    }
}

/// The tile used throughout the scenarios: x∈[50,150], y∈[-10,10].
pub fn corridor_tile(store: &MemoryStore) -> Tile {
    store.create_trip_tile(trip_spec("corridor", Rect::from_extents(50.0, 150.0, -10.0, 10.0)))
}

pub fn hero_at(store: &MemoryStore, at: Point) -> Token {
    store.insert_token(Token {
        id: TokenId::new("hero"),
        scene_id: SceneId::new(SCENE),
        x: at.x,
        y: at.y,
        width: 1.0,
        height: 1.0,
        disposition: Disposition::Friendly,
        hidden: false,
        owner: None,
        revision: 0,
    })
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

/// Build a module for `client` and open the test scene on `channel`.
pub async fn open_scene(
    client: &Client,
    config: TripwireConfig,
    channel: Arc<dyn SocketChannel>,
) -> (TripwireModule, Arc<SocketController>) {
    let mut module = TripwireModule::new(config, client.collaborators());
    let socket = module
        .scene_ready(client.scene(), channel)
        .await
        .expect("scene ready");
    (module, socket)
}

pub fn request(tile: &Tile, token: &Token, sender: &str, revision: u64) -> SocketEnvelope {
    let origin = tile.origin();
    SocketEnvelope::new(
        SceneId::new(SCENE),
        UserId::new(sender),
        SocketMessage::RequestTrigger(TriggerRequest {
            tile_id: tile.id.clone(),
            token_id: token.id.clone(),
            x: origin.x,
            y: origin.y,
            revision,
        }),
    )
}

/// Values written to `triggered` since `events` was subscribed, in order.
pub fn triggered_writes(events: &mut broadcast::Receiver<DocumentEvent>) -> Vec<bool> {
    let mut writes = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let DocumentEvent::TileUpdated { patch, .. } = event {
            if let Some(value) = patch.triggered {
                writes.push(value);
            }
        }
    }
    writes
}
