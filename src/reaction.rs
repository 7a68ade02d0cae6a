//! ReactionCoordinator – maps a tile's anim type onto an [`Animator`] run.

use crate::animation::{AnimationKind, Animator};
use crate::session::SceneContext;
use crate::token_calc::TokenCalculator;
use crate::types::{AnimType, Token};
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct ReactionCoordinator {
    calculator: TokenCalculator,
    animator: Arc<Animator>,
    icon_scale: f64,
}

impl ReactionCoordinator {
    pub fn new(calculator: TokenCalculator, animator: Arc<Animator>, icon_scale: f64) -> Self {
        Self {
            calculator,
            animator,
            icon_scale,
        }
    }

    /// Start the reaction above `token` on the scene's render layer.
    ///
    /// Returns the animation task, or `None` for [`AnimType::None`]. Callers
    /// are free to drop the handle; the animation runs to completion.
    pub fn handle_token_reaction(
        &self,
        scene: &SceneContext,
        token: &Token,
        anim_type: AnimType,
    ) -> Option<JoinHandle<()>> {
        let kind = AnimationKind::from_anim_type(anim_type)?;
        let anchor = self.calculator.reaction_anchor(token, scene.grid_size);
        let size = scene.grid_size * self.icon_scale;

        debug!("Reaction {:?} for token {} at {}", kind, token.id, anchor);

        let animator = self.animator.clone();
        let layer = scene.layer.clone();
        Some(tokio::spawn(async move {
            animator.play(layer, kind, anchor, size).await;
        }))
    }
}
