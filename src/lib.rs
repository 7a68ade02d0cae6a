//! Tripwire
//!
//! Invisible "trip" tiles for virtual tabletop scenes. When a token's movement
//! crosses one, every connected client observes exactly one reaction: the
//! token snaps onto the tile, the camera pans there, an optional macro fires
//! and a reaction icon animates over the token.
//!
//! ## Architecture
//!
//! ```text
//! TripwireModule  (session.rs)          ← scene lifecycle, movement entry points
//!   ├── TokenHooks  (hooks.rs)          ← eligibility gate
//!   └── TokenUpdateCoordinator  (coordinator.rs)
//!         ├── TriggeringHandler  (triggering.rs)
//!         │     └── Collision  (collision.rs)
//!         └── SocketController  (socket.rs)  ← single-authority execution
//!               ├── SocketChannel  (transport.rs)
//!               └── PostTriggerActions  (post_trigger.rs)
//!                     ├── MacroOperations  (macros.rs)
//!                     ├── GameChanger  (game.rs)
//!                     └── ReactionCoordinator  (reaction.rs)
//!                           ├── TokenCalculator  (token_calc.rs)
//!                           └── Animator  (animation.rs)
//! ```
//!
//! Host services (documents, identity, camera, macros, rendering) are traits;
//! [`MemoryStore`], [`LocalBus`] and [`StaticAuthority`] are in-process
//! implementations.

pub mod animation;
pub mod authoring;
pub mod collision;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod hooks;
pub mod identity;
pub mod macros;
pub mod post_trigger;
pub mod protocol;
pub mod reaction;
pub mod session;
pub mod socket;
pub mod store;
pub mod token_calc;
pub mod transport;
pub mod triggering;
pub mod types;

pub use collision::Collision;
pub use config::TripwireConfig;
pub use coordinator::{CoordinationOutcome, TokenPhase, TokenUpdateCoordinator};
pub use error::{Result, TripwireError};
pub use identity::{SessionAuthority, StaticAuthority};
pub use session::{Collaborators, SceneContext, TripwireModule};
pub use socket::{SocketController, TriggerOutcome};
pub use store::{DocumentEvent, DocumentStore, MemoryStore};
#[cfg(feature = "server")]
pub use transport::NatsChannel;
pub use transport::{LocalBus, LocalEndpoint, SocketChannel};
pub use triggering::{TriggerHit, TriggeringHandler};
pub use types::{
    AnimType, Disposition, MacroId, Point, Rect, SceneId, Tile, TileFlags, TileId, Token,
    TokenChange, TokenId, UserId,
};
