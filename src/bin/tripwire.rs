//! tripwire-server binary
//!
//! Headless authority peer. Loads a scene into an in-memory document store,
//! joins the module socket on NATS as the session authority and executes
//! incoming trigger requests until shut down.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                     | Default                 | Description                     |
//! |-------------------------|-------------------------|---------------------------------|
//! | `TRIPWIRE_SCENE`        | `default`               | Scene id to serve               |
//! | `TRIPWIRE_USER`         | `gm`                    | Authority user id               |
//! | `TRIPWIRE_ENDPOINT`     | `nats://localhost:4222` | NATS endpoint                   |
//! | `TRIPWIRE_SCENE_FILE`   | *(none)*                | JSON `{ tiles, tokens }` seed   |
//! | `TRIPWIRE_GRID_SIZE`    | `100`                   | Pixels per grid cell            |
//! | `TRIPWIRE_CONFIG`       | *(none)*                | TOML module settings            |

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tripwire::{
    animation::{Frame, RenderLayer, SpriteId},
    game::{Camera, SessionClock},
    macros::MacroRegistry,
    protocol::subjects,
    store::SceneDocuments,
    Collaborators, MacroId, MemoryStore, NatsChannel, Point, SceneContext, SceneId,
    StaticAuthority, Token, TripwireConfig, TripwireError, TripwireModule,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "tripwire-server", about = "Tripwire authority peer", version)]
struct Args {
    /// Scene to serve
    #[arg(long, env = "TRIPWIRE_SCENE", default_value = "default")]
    scene: String,

    /// Authority user id advertised on the socket
    #[arg(long, env = "TRIPWIRE_USER", default_value = "gm")]
    user: String,

    /// NATS endpoint
    #[arg(long, env = "TRIPWIRE_ENDPOINT", default_value = "nats://localhost:4222")]
    endpoint: String,

    /// Scene documents to load (JSON with `tiles` and `tokens`)
    #[arg(long, env = "TRIPWIRE_SCENE_FILE")]
    scene_file: Option<PathBuf>,

    /// Pixels per grid cell
    #[arg(long, env = "TRIPWIRE_GRID_SIZE", default_value_t = 100.0)]
    grid_size: f64,

    /// Module settings (TOML)
    #[arg(long, env = "TRIPWIRE_CONFIG")]
    config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Log-only host services
// ---------------------------------------------------------------------------

struct LogCamera;

#[async_trait]
impl Camera for LogCamera {
    async fn pan_to(&self, to: Point) {
        tracing::info!(%to, "camera pan");
    }
}

struct LogClock;

#[async_trait]
impl SessionClock for LogClock {
    async fn pause(&self) {
        tracing::info!("session paused");
    }
}

/// Macros run on the host; this peer only records the request.
struct LogMacros;

#[async_trait]
impl MacroRegistry for LogMacros {
    fn contains(&self, _id: &MacroId) -> bool {
        true
    }

    async fn execute(&self, id: &MacroId, token: &Token) -> Result<(), TripwireError> {
        tracing::info!(macro_id = %id, token = %token.id, "macro requested");
        Ok(())
    }
}

#[derive(Default)]
struct LogLayer {
    next: AtomicU64,
}

impl RenderLayer for LogLayer {
    fn spawn_sprite(&self, asset: &str, anchor: Point, size: f64) -> SpriteId {
        let id = SpriteId(self.next.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(sprite = id.0, asset, %anchor, size, "reaction start");
        id
    }

    fn update_sprite(&self, _sprite: SpriteId, _frame: Frame) {}

    fn remove_sprite(&self, sprite: SpriteId) {
        tracing::debug!(sprite = sprite.0, "reaction end");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tripwire=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = TripwireConfig::load(args.config.as_deref()).context("Failed to load settings")?;

    tracing::info!(
        "Starting tripwire-server (scene='{}', user='{}', endpoint='{}')",
        args.scene,
        args.user,
        args.endpoint,
    );

    // Scene documents
    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &args.scene_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        let docs: SceneDocuments = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid scene file {}", path.display()))?;
        tracing::info!(
            "Loaded {} tiles and {} tokens",
            docs.tiles.len(),
            docs.tokens.len()
        );
        store.load_scene(docs);
    }

    let deps = Collaborators {
        store: store.clone(),
        authority: Arc::new(StaticAuthority::gm(args.user.clone())),
        camera: Arc::new(LogCamera),
        clock: Arc::new(LogClock),
        macros: Arc::new(LogMacros),
    };

    let channel = NatsChannel::connect(&args.endpoint, subjects::MODULE_SOCKET)
        .await
        .context("Failed to connect tripwire socket to NATS")?;

    let mut module = TripwireModule::new(config, deps);
    let scene = SceneContext::new(
        SceneId::new(args.scene),
        args.grid_size,
        Arc::new(LogLayer::default()),
    );
    let socket = module
        .scene_ready(scene, Arc::new(channel))
        .await
        .context("Failed to open scene socket")?;
    socket.on_executed(|ack| tracing::info!(tile = %ack.tile_id, token = %ack.token_id, "trigger executed"));

    // -----------------------------------------------------------------------
    // Run until shutdown
    // -----------------------------------------------------------------------

    tokio::select! {
        _ = module.run_document_sync(store.subscribe()) => {
            tracing::error!("Document sync ended unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("tripwire-server shutting down (SIGINT)");
        }
    }

    module.shutdown().await;
    Ok(())
}
