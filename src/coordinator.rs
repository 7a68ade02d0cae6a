//! TokenUpdateCoordinator – pairs pre-move and post-move token states.
//!
//! Per token: `Idle → PendingMove → Evaluating → Idle`.
//!
//! The "before" position is only observable before the host commits the
//! update, so [`register_token_init_pos`](TokenUpdateCoordinator::register_token_init_pos)
//! must run on the pre-commit notification and
//! [`coordinate_update`](TokenUpdateCoordinator::coordinate_update) on the
//! matching post-commit one.

use crate::socket::{SocketController, TriggerOutcome};
use crate::triggering::TriggeringHandler;
use crate::types::{Point, Tile, Token, TokenId};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenPhase {
    Idle,
    PendingMove { before: Point },
    Evaluating,
}

#[derive(Debug)]
pub enum CoordinationOutcome {
    /// The movement event was filtered out before evaluation.
    Ineligible,
    /// No pre-move position was registered for this token.
    NoPendingMove,
    /// Evaluated; no tile fires.
    NoTrigger,
    /// A tile fired and was handed to the socket controller.
    Delegated(TriggerOutcome),
}

pub struct TokenUpdateCoordinator {
    handler: TriggeringHandler,
    socket: Arc<SocketController>,
    phases: Mutex<HashMap<TokenId, TokenPhase>>,
}

impl TokenUpdateCoordinator {
    pub fn new(handler: TriggeringHandler, socket: Arc<SocketController>) -> Self {
        Self {
            handler,
            socket,
            phases: Mutex::new(HashMap::new()),
        }
    }

    /// Record `token`'s current position ahead of a movement commit.
    /// A newer registration replaces any older one.
    pub fn register_token_init_pos(&self, token: &Token) {
        self.phases.lock().insert(
            token.id.clone(),
            TokenPhase::PendingMove {
                before: token.position(),
            },
        );
    }

    /// Forget a pending record without evaluating it.
    pub fn discard(&self, id: &TokenId) {
        let mut phases = self.phases.lock();
        if matches!(phases.get(id), Some(TokenPhase::PendingMove { .. })) {
            phases.remove(id);
        }
    }

    pub fn phase(&self, id: &TokenId) -> TokenPhase {
        self.phases
            .lock()
            .get(id)
            .copied()
            .unwrap_or(TokenPhase::Idle)
    }

    /// Evaluate a committed movement of `moved` against `candidates`.
    pub async fn coordinate_update(&self, moved: &Token, candidates: &[Tile]) -> CoordinationOutcome {
        let before = {
            let mut phases = self.phases.lock();
            match phases.get(&moved.id).copied() {
                Some(TokenPhase::PendingMove { before }) => {
                    phases.insert(moved.id.clone(), TokenPhase::Evaluating);
                    before
                }
                _ => {
                    debug!("No pre-move position for token {}", moved.id);
                    return CoordinationOutcome::NoPendingMove;
                }
            }
        };

        let outcome = match self
            .handler
            .find_triggered_tile(before, moved.position(), candidates)
        {
            Some(hit) => {
                debug!(
                    "Token {} crossed tile {} at {}",
                    moved.id, hit.tile.id, hit.crossing
                );
                CoordinationOutcome::Delegated(
                    self.socket
                        .request_trigger(&hit.tile, moved, hit.crossing)
                        .await,
                )
            }
            None => CoordinationOutcome::NoTrigger,
        };

        // Back to idle, unless a newer movement registered meanwhile.
        let mut phases = self.phases.lock();
        if matches!(phases.get(&moved.id), Some(TokenPhase::Evaluating)) {
            phases.remove(&moved.id);
        }
        outcome
    }
}
