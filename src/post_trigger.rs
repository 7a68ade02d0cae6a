//! PostTriggerActions – the ordered side effects of a confirmed trigger.
//!
//! Only the authority runs this, and only after the
//! [`SocketController`](crate::socket::SocketController) re-validated the
//! tile. Order: macro → snap → pan (+ optional pause) → reaction → flip.
//!
//! Every step is best-effort. If the authority drops mid-sequence the earlier
//! steps stay applied; nothing is rolled back.

use crate::game::GameChanger;
use crate::macros::{MacroOperations, MacroOutcome};
use crate::reaction::ReactionCoordinator;
use crate::session::SceneContext;
use crate::store::DocumentStore;
use crate::types::{ChangeOrigin, Tile, TileFlagsPatch, Token};
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What a single execution did.
#[derive(Debug)]
pub struct TriggerReport {
    pub macro_outcome: MacroOutcome,
    /// Token after the snap, if the write committed.
    pub snapped: Option<Token>,
    pub pan: JoinHandle<()>,
    pub reaction: Option<JoinHandle<()>>,
    /// The `triggered` flip reached the store.
    pub flipped: bool,
}

pub struct PostTriggerActions {
    scene: SceneContext,
    store: Arc<dyn DocumentStore>,
    game: GameChanger,
    macros: MacroOperations,
    reactions: ReactionCoordinator,
    pause_on_trigger: bool,
}

impl PostTriggerActions {
    pub fn new(
        scene: SceneContext,
        store: Arc<dyn DocumentStore>,
        game: GameChanger,
        macros: MacroOperations,
        reactions: ReactionCoordinator,
        pause_on_trigger: bool,
    ) -> Self {
        Self {
            scene,
            store,
            game,
            macros,
            reactions,
            pause_on_trigger,
        }
    }

    pub async fn execute(&self, token: &Token, tile: &Tile) -> TriggerReport {
        // 1. Macro first; a failure never blocks the rest.
        let macro_outcome = self.macros.handle_tile_macro_firing(tile, token).await;

        // 2. Snap onto the tile. Marked so the resulting update is not
        //    evaluated as a fresh movement.
        let snapped = match self
            .store
            .update_token_position(&token.id, tile.origin(), ChangeOrigin::TriggerSnap)
            .await
        {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Failed to snap token {} onto tile {}: {}", token.id, tile.id, e);
                None
            }
        };
        let current = snapped.clone().unwrap_or_else(|| token.clone());

        // 3. Pan once the snap is committed, without waiting for it.
        let pan = self.game.pan_detached(current.position());
        if self.pause_on_trigger {
            self.game.pause().await;
        }

        // 4. Reaction above the post-snap position.
        let anim_type = tile.flags.as_ref().map(|f| f.anim_type).unwrap_or_default();
        let reaction = self
            .reactions
            .handle_token_reaction(&self.scene, &current, anim_type);

        // Finally the one persisted flip every client observes.
        let flipped = self.flip(tile).await;

        info!(
            "Tile {} triggered by token {} (macro: {:?})",
            tile.id, token.id, macro_outcome
        );

        TriggerReport {
            macro_outcome,
            snapped,
            pan,
            reaction,
            flipped,
        }
    }

    /// Consume the tile; unlimited tiles are re-armed right away.
    async fn flip(&self, tile: &Tile) -> bool {
        if let Err(e) = self
            .store
            .patch_tile_flags(&tile.id, TileFlagsPatch::triggered(true))
            .await
        {
            warn!("Failed to mark tile {} triggered: {}", tile.id, e);
            return false;
        }

        if tile.is_unlimited() {
            if let Err(e) = self
                .store
                .patch_tile_flags(&tile.id, TileFlagsPatch::triggered(false))
                .await
            {
                warn!("Failed to re-arm unlimited tile {}: {}", tile.id, e);
                return false;
            }
        }
        true
    }
}
