//! # Playback Coordinator
//!
//! Session-wide registry of which player is audible. Starting one player
//! makes every other player "silenced"; each of them observes that and pauses
//! itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Identifier of one mounted player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tracks the single currently-audible player.
///
/// Every mutation goes through the watch sender, so calls are applied one at
/// a time and subscribers see each change.
#[derive(Debug)]
pub struct PlaybackCoordinator {
    holder: watch::Sender<Option<InstanceId>>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        let (holder, _) = watch::channel(None);
        Self { holder }
    }

    /// Record `id` as audible. The last starter wins.
    pub fn on_start(&self, id: InstanceId) {
        let previous = self.holder.send_replace(Some(id));
        debug!(instance = %id, previous = ?previous, "Playback started");
    }

    /// Clear the registry if `id` holds it. Returns whether it did.
    pub fn on_stop(&self, id: InstanceId) -> bool {
        let cleared = self.holder.send_if_modified(|holder| {
            if *holder == Some(id) {
                *holder = None;
                true
            } else {
                false
            }
        });

        if cleared {
            debug!(instance = %id, "Playback stopped");
        }
        cleared
    }

    pub fn current(&self) -> Option<InstanceId> {
        *self.holder.borrow()
    }

    /// True while some other player is audible.
    pub fn should_be_silenced(&self, id: InstanceId) -> bool {
        matches!(self.current(), Some(holder) if holder != id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<InstanceId>> {
        self.holder.subscribe()
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
