//! Process-scoped module lifecycle and the movement entry points.
//!
//! [`TripwireModule`] owns the per-scene stack. A scene becoming ready
//! tears down the previous [`SocketController`] before a new one opens, so
//! there is never more than one active channel per process.
//!
//! The event-dispatch glue calls, for every token movement and in order:
//!
//! 1. [`TripwireModule::before_token_update`] on the pre-commit notification,
//! 2. [`TripwireModule::after_token_update`] on the post-commit notification,
//!    which runs [`TripwireModule::can_run_token_update`] first.

use crate::animation::{Animator, RenderLayer};
use crate::collision::Collision;
use crate::config::TripwireConfig;
use crate::coordinator::{CoordinationOutcome, TokenUpdateCoordinator};
use crate::error::Result;
use crate::game::{Camera, GameChanger, SessionClock};
use crate::hooks::TokenHooks;
use crate::identity::SessionAuthority;
use crate::macros::{MacroOperations, MacroRegistry};
use crate::post_trigger::PostTriggerActions;
use crate::reaction::ReactionCoordinator;
use crate::socket::SocketController;
use crate::store::{DocumentEvent, DocumentStore};
use crate::token_calc::TokenCalculator;
use crate::transport::SocketChannel;
use crate::triggering::TriggeringHandler;
use crate::types::{SceneId, Token, TokenChange};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::broadcast;

/// The scene currently shown, with its render layer.
#[derive(Clone)]
pub struct SceneContext {
    pub scene_id: SceneId,
    /// Pixels per grid cell.
    pub grid_size: f64,
    pub layer: Arc<dyn RenderLayer>,
}

impl SceneContext {
    pub fn new(scene_id: SceneId, grid_size: f64, layer: Arc<dyn RenderLayer>) -> Self {
        Self {
            scene_id,
            grid_size,
            layer,
        }
    }
}

/// Host services the module depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    pub authority: Arc<dyn SessionAuthority>,
    pub camera: Arc<dyn Camera>,
    pub clock: Arc<dyn SessionClock>,
    pub macros: Arc<dyn MacroRegistry>,
}

struct SceneRuntime {
    scene: SceneContext,
    socket: Arc<SocketController>,
    coordinator: TokenUpdateCoordinator,
}

pub struct TripwireModule {
    config: TripwireConfig,
    deps: Collaborators,
    hooks: TokenHooks,
    animator: Arc<Animator>,
    active: Option<SceneRuntime>,
}

impl TripwireModule {
    pub fn new(config: TripwireConfig, deps: Collaborators) -> Self {
        let hooks = TokenHooks::new(&config);
        let animator = Arc::new(Animator::new(config.reaction.clone()));
        Self {
            config,
            deps,
            hooks,
            animator,
            active: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Build the stack for a newly ready scene on `channel`.
    ///
    /// Any previous socket is deactivated first.
    pub async fn scene_ready(
        &mut self,
        scene: SceneContext,
        channel: Arc<dyn SocketChannel>,
    ) -> Result<Arc<SocketController>> {
        self.shutdown().await;

        let actions = PostTriggerActions::new(
            scene.clone(),
            self.deps.store.clone(),
            GameChanger::new(self.deps.camera.clone(), self.deps.clock.clone()),
            MacroOperations::new(self.deps.macros.clone()),
            ReactionCoordinator::new(
                TokenCalculator::new(self.config.reaction.offset),
                self.animator.clone(),
                self.config.reaction.icon_scale,
            ),
            self.config.pause_on_trigger,
        );

        let socket = SocketController::new(
            scene.scene_id.clone(),
            channel,
            self.deps.authority.clone(),
            self.deps.store.clone(),
            actions,
        );
        socket.init().await?;

        let coordinator = TokenUpdateCoordinator::new(
            TriggeringHandler::new(Collision::new()),
            socket.clone(),
        );

        info!("Tripwire ready on scene {}", scene.scene_id);
        self.active = Some(SceneRuntime {
            scene,
            socket: socket.clone(),
            coordinator,
        });
        Ok(socket)
    }

    /// Deactivate the current scene's socket, if any.
    pub async fn shutdown(&mut self) {
        if let Some(runtime) = self.active.take() {
            runtime.socket.deactivate().await;
        }
    }

    pub fn active_scene(&self) -> Option<&SceneId> {
        self.active.as_ref().map(|r| &r.scene.scene_id)
    }

    pub fn socket(&self) -> Option<&Arc<SocketController>> {
        self.active.as_ref().map(|r| &r.socket)
    }

    pub fn coordinator(&self) -> Option<&TokenUpdateCoordinator> {
        self.active.as_ref().map(|r| &r.coordinator)
    }

    // -----------------------------------------------------------------------
    // Movement entry points
    // -----------------------------------------------------------------------

    pub fn can_run_token_update(&self, change: &TokenChange, token: &Token) -> bool {
        self.hooks
            .can_run_token_update(change, token, self.deps.authority.is_paused())
    }

    /// Pre-commit notification for `token` (still at its old position).
    pub fn before_token_update(&self, token: &Token) {
        if let Some(runtime) = self.runtime_for(&token.scene_id) {
            runtime.coordinator.register_token_init_pos(token);
        }
    }

    /// Post-commit notification for `token` (now at its new position).
    pub async fn after_token_update(&self, token: &Token, change: &TokenChange) -> CoordinationOutcome {
        let Some(runtime) = self.runtime_for(&token.scene_id) else {
            return CoordinationOutcome::Ineligible;
        };

        if !self.can_run_token_update(change, token) {
            runtime.coordinator.discard(&token.id);
            return CoordinationOutcome::Ineligible;
        }

        let tiles = match self.deps.store.scene_tiles(&token.scene_id).await {
            Ok(tiles) => tiles,
            Err(e) => {
                warn!("Could not load tiles for scene {}: {}", token.scene_id, e);
                runtime.coordinator.discard(&token.id);
                return CoordinationOutcome::NoTrigger;
            }
        };

        runtime.coordinator.coordinate_update(token, &tiles).await
    }

    /// Feed one committed document change from the sync channel.
    pub async fn handle_document_event(&self, event: &DocumentEvent) -> Option<CoordinationOutcome> {
        match event {
            DocumentEvent::TokenUpdated {
                before,
                after,
                change,
            } => {
                self.before_token_update(before);
                Some(self.after_token_update(after, change).await)
            }
            _ => None,
        }
    }

    /// Drive the module from a document sync subscription until it closes.
    pub async fn run_document_sync(&self, mut events: broadcast::Receiver<DocumentEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_document_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Document sync lagged, {} changes skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Document sync ended");
    }

    fn runtime_for(&self, scene: &SceneId) -> Option<&SceneRuntime> {
        self.active
            .as_ref()
            .filter(|runtime| &runtime.scene.scene_id == scene)
    }
}
