//! Identity / permission boundary.
//!
//! The core only ever branches on the booleans exposed here.

use crate::types::UserId;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait SessionAuthority: Send + Sync {
    fn user_id(&self) -> &UserId;
    /// Is the current user the session authority (GM)?
    fn is_authority(&self) -> bool;
    fn is_paused(&self) -> bool;
}

/// Fixed identity with a toggleable pause state.
#[derive(Debug)]
pub struct StaticAuthority {
    user: UserId,
    authority: bool,
    paused: AtomicBool,
}

impl StaticAuthority {
    pub fn new(user: UserId, authority: bool) -> Self {
        Self {
            user,
            authority,
            paused: AtomicBool::new(false),
        }
    }

    pub fn gm(user: impl Into<String>) -> Self {
        Self::new(UserId::new(user), true)
    }

    pub fn player(user: impl Into<String>) -> Self {
        Self::new(UserId::new(user), false)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl SessionAuthority for StaticAuthority {
    fn user_id(&self) -> &UserId {
        &self.user
    }

    fn is_authority(&self) -> bool {
        self.authority
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
