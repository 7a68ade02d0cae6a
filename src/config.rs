//! Module settings.
//!
//! Loaded with the `config` crate from an optional TOML file, overridden by
//! `TRIPWIRE_*` environment variables (nested keys use `__`, e.g.
//! `TRIPWIRE_REACTION__HOLD_MS=1200`).

use crate::error::Result;
use crate::types::Disposition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Timing and placement of reaction icons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Pixels the icon anchor is lifted above the token's top edge.
    pub offset: f64,
    /// Icon size as a fraction of the grid size.
    pub icon_scale: f64,
    pub appear_ms: u64,
    pub hold_ms: u64,
    pub fade_ms: u64,
    /// Frame interval used when sampling the easing curves.
    pub frame_ms: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            offset: 8.0,
            icon_scale: 0.5,
            appear_ms: 300,
            hold_ms: 900,
            fade_ms: 400,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripwireConfig {
    /// Pause the session clock after a trigger executes.
    pub pause_on_trigger: bool,
    /// Evaluate movement while the session is paused.
    pub trigger_when_paused: bool,
    /// Let tokens hidden from players spring trip tiles.
    pub trigger_when_hidden: bool,
    /// Token dispositions allowed to spring trip tiles.
    pub trigger_dispositions: Vec<Disposition>,
    pub reaction: ReactionConfig,
}

impl Default for TripwireConfig {
    fn default() -> Self {
        Self {
            pause_on_trigger: false,
            trigger_when_paused: false,
            trigger_when_hidden: false,
            trigger_dispositions: vec![Disposition::Friendly],
            reaction: ReactionConfig::default(),
        }
    }
}

impl TripwireConfig {
    /// Layer defaults, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("TRIPWIRE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn disposition_allowed(&self, disposition: Disposition) -> bool {
        self.trigger_dispositions.contains(&disposition)
    }
}
