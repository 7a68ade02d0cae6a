//! SocketController – single-authority execution of triggers.
//!
//! Every client sees the same movement and may detect the same crossing.
//! Only the authority (GM) executes; everyone else asks it to.
//!
//! ```text
//! player client                      authority client
//! ─────────────                      ────────────────
//! request_trigger()                  request_trigger()
//!   └─ emit REQUEST_TRIGGER ───────▶   │ (short-circuit, no hop)
//!                                      ▼
//!                                   execute_request()  ◀── FIFO lock
//!                                     ├─ drop already-handled move
//!                                     ├─ re-validate tile + token
//!                                     ├─ PostTriggerActions
//!   ◀────────── TRIGGER_EXECUTED ─────┘ (advisory)
//! ```
//!
//! Lifecycle: [`SocketController::init`] opens the channel and starts the
//! listener; [`SocketController::deactivate`] stops it. The caller must
//! deactivate an old controller before initialising a new one
//! (see [`TripwireModule::scene_ready`](crate::session::TripwireModule::scene_ready)).

use crate::error::Result;
use crate::identity::SessionAuthority;
use crate::post_trigger::{PostTriggerActions, TriggerReport};
use crate::protocol::{SocketEnvelope, SocketMessage, TriggerExecuted, TriggerRequest};
use crate::store::DocumentStore;
use crate::transport::SocketChannel;
use crate::types::{Point, SceneId, Tile, TileId, Token, TokenId, UserId};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Result of asking for, or handling, a trigger.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// This client is the authority and ran the post-trigger actions.
    Executed(TriggerReport),
    /// The request went out to the authority.
    Requested,
    /// The tile was already consumed, disabled or gone.
    Stale,
    /// This move (tile, token, revision) was already handled, possibly on
    /// behalf of another client.
    Duplicate,
    /// Not for us: wrong scene, or a request reaching a non-authority.
    Ignored,
    /// Advisory acknowledgement received.
    Acknowledged(TriggerExecuted),
    /// The request could not be sent; the crossing is not applied.
    ChannelUnavailable,
}

impl TriggerOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, TriggerOutcome::Executed(_))
    }
}

type AckHook = Arc<dyn Fn(&TriggerExecuted) + Send + Sync>;

/// Latest handled token revision per (tile, token). One entry per pair, so
/// the table is bounded by the scene's tiles and tokens.
type HandledMoves = HashMap<(TileId, TokenId), u64>;

pub struct SocketController {
    scene: SceneId,
    channel: Arc<dyn SocketChannel>,
    authority: Arc<dyn SessionAuthority>,
    store: Arc<dyn DocumentStore>,
    actions: PostTriggerActions,
    /// Serialises executions; tokio's mutex hands out the lock FIFO.
    executions: tokio::sync::Mutex<HandledMoves>,
    listener: Mutex<Option<JoinHandle<()>>>,
    on_executed: Mutex<Option<AckHook>>,
}

impl SocketController {
    pub fn new(
        scene: SceneId,
        channel: Arc<dyn SocketChannel>,
        authority: Arc<dyn SessionAuthority>,
        store: Arc<dyn DocumentStore>,
        actions: PostTriggerActions,
    ) -> Arc<Self> {
        Arc::new(Self {
            scene,
            channel,
            authority,
            store,
            actions,
            executions: tokio::sync::Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
            on_executed: Mutex::new(None),
        })
    }

    pub fn scene(&self) -> &SceneId {
        &self.scene
    }

    /// Register a callback for advisory `TRIGGER_EXECUTED` messages.
    pub fn on_executed(&self, hook: impl Fn(&TriggerExecuted) + Send + Sync + 'static) {
        *self.on_executed.lock() = Some(Arc::new(hook));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the channel and start handling inbound messages in arrival order.
    pub async fn init(self: &Arc<Self>) -> Result<()> {
        let mut rx = self.channel.listen().await?;
        let this: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let Some(controller) = this.upgrade() else {
                    break;
                };
                controller.handle_envelope(envelope).await;
            }
        });

        if let Some(old) = self.listener.lock().replace(handle) {
            warn!("SocketController for scene {} initialised twice", self.scene);
            old.abort();
        }
        info!(
            "Socket open for scene {} (authority: {})",
            self.scene,
            self.authority.is_authority()
        );
        Ok(())
    }

    pub async fn deactivate(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        self.channel.close().await;
        info!("Socket closed for scene {}", self.scene);
    }

    pub fn is_active(&self) -> bool {
        self.listener.lock().is_some()
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Ask for `tile` to be fired by `token`. The authority executes directly.
    pub async fn request_trigger(&self, tile: &Tile, token: &Token, crossing: Point) -> TriggerOutcome {
        let request = TriggerRequest {
            tile_id: tile.id.clone(),
            token_id: token.id.clone(),
            x: crossing.x,
            y: crossing.y,
            revision: token.revision,
        };

        if self.authority.is_authority() {
            let sender = self.authority.user_id().clone();
            return self.execute_request(&request, &sender).await;
        }

        let envelope = SocketEnvelope::new(
            self.scene.clone(),
            self.authority.user_id().clone(),
            SocketMessage::RequestTrigger(request),
        );
        match self.channel.emit(&envelope).await {
            Ok(()) => {
                debug!("Requested trigger of tile {} for token {}", tile.id, token.id);
                TriggerOutcome::Requested
            }
            Err(e) => {
                warn!("Trigger request for tile {} not sent: {}", tile.id, e);
                TriggerOutcome::ChannelUnavailable
            }
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    pub async fn handle_envelope(&self, envelope: SocketEnvelope) -> TriggerOutcome {
        if envelope.scene != self.scene {
            debug!("Ignoring socket message for scene {}", envelope.scene);
            return TriggerOutcome::Ignored;
        }

        match envelope.message {
            SocketMessage::RequestTrigger(request) => {
                if !self.authority.is_authority() {
                    return TriggerOutcome::Ignored;
                }
                self.execute_request(&request, &envelope.sender).await
            }
            SocketMessage::TriggerExecuted(ack) => {
                debug!("Tile {} executed by {}", ack.tile_id, envelope.sender);
                let hook = self.on_executed.lock().clone();
                if let Some(hook) = hook {
                    hook(&ack);
                }
                TriggerOutcome::Acknowledged(ack)
            }
        }
    }

    /// Authority-side execution. Holds the execution lock from the duplicate
    /// check through the flip, so a racing request sees the consumed tile.
    async fn execute_request(&self, request: &TriggerRequest, sender: &UserId) -> TriggerOutcome {
        let mut handled = self.executions.lock().await;

        let key = (request.tile_id.clone(), request.token_id.clone());
        if handled
            .get(&key)
            .is_some_and(|&revision| request.revision <= revision)
        {
            debug!(
                "Duplicate trigger request for tile {} (token {} r{}) from {}",
                request.tile_id, request.token_id, request.revision, sender
            );
            return TriggerOutcome::Duplicate;
        }
        handled.insert(key, request.revision);

        let Some((tile, token)) = self.revalidate(request).await else {
            return TriggerOutcome::Stale;
        };

        let report = self.actions.execute(&token, &tile).await;

        let ack = SocketEnvelope::new(
            self.scene.clone(),
            self.authority.user_id().clone(),
            SocketMessage::TriggerExecuted(TriggerExecuted {
                tile_id: tile.id.clone(),
                token_id: token.id.clone(),
            }),
        );
        if let Err(e) = self.channel.emit(&ack).await {
            warn!("Could not broadcast execution of tile {}: {}", tile.id, e);
        }

        TriggerOutcome::Executed(report)
    }

    /// Fresh reads of tile and token; `None` if the request no longer applies.
    async fn revalidate(&self, request: &TriggerRequest) -> Option<(Tile, Token)> {
        let tile = match self.store.tile(&request.tile_id).await {
            Ok(Some(tile)) => tile,
            Ok(None) => {
                debug!("Dropping request: tile {} is gone", request.tile_id);
                return None;
            }
            Err(e) => {
                warn!("Dropping request: reading tile {}: {}", request.tile_id, e);
                return None;
            }
        };

        if tile.scene_id != self.scene || !tile.can_fire() {
            debug!("Dropping stale request for tile {}", tile.id);
            return None;
        }

        match self.store.token(&request.token_id).await {
            Ok(Some(token)) => Some((tile, token)),
            Ok(None) => {
                debug!("Dropping request: token {} is gone", request.token_id);
                None
            }
            Err(e) => {
                warn!("Dropping request: reading token {}: {}", request.token_id, e);
                None
            }
        }
    }
}
