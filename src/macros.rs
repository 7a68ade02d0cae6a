//! MacroOperations – fires a tile's macro scoped to the triggering token.

use crate::error::TripwireError;
use crate::types::{MacroId, Tile, Token};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

/// Host macro registry.
#[async_trait]
pub trait MacroRegistry: Send + Sync {
    fn contains(&self, id: &MacroId) -> bool;
    async fn execute(&self, id: &MacroId, token: &Token) -> Result<(), TripwireError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutcome {
    /// The tile has no macro configured.
    NoMacro,
    /// The configured macro no longer exists.
    Missing(MacroId),
    Executed(MacroId),
    Failed(MacroId),
}

pub struct MacroOperations {
    registry: Arc<dyn MacroRegistry>,
}

impl MacroOperations {
    pub fn new(registry: Arc<dyn MacroRegistry>) -> Self {
        Self { registry }
    }

    /// Execute the tile's macro, if any. Failures are logged, never returned.
    pub async fn handle_tile_macro_firing(&self, tile: &Tile, token: &Token) -> MacroOutcome {
        let Some(id) = tile.flags.as_ref().and_then(|f| f.macro_id.clone()) else {
            debug!("Tile {} has no macro", tile.id);
            return MacroOutcome::NoMacro;
        };

        if !self.registry.contains(&id) {
            warn!("Tile {} references missing macro {}", tile.id, id);
            return MacroOutcome::Missing(id);
        }

        match self.registry.execute(&id, token).await {
            Ok(()) => {
                info!("Executed macro {} for token {}", id, token.id);
                MacroOutcome::Executed(id)
            }
            Err(e) => {
                warn!("Macro {} failed for tile {}: {}", id, tile.id, e);
                MacroOutcome::Failed(id)
            }
        }
    }
}
