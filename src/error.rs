//! Crate error type.
//!
//! Nothing here is fatal to a session: callers in the trigger pipeline log
//! these and degrade to "trigger did not fire".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripwireError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("document store error: {0}")]
    Store(String),

    #[error("socket channel unavailable: {0}")]
    Channel(String),

    #[error("macro '{id}' failed: {reason}")]
    Macro { id: String, reason: String },

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl TripwireError {
    pub fn tile_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind: "tile",
            id: id.to_string(),
        }
    }

    pub fn token_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind: "token",
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TripwireError>;
