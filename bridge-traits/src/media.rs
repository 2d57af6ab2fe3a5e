//! Media bridge traits and supporting types.
//!
//! The engine never decodes audio itself. Hosts provide a [`MediaBackend`]
//! wrapping whatever primitive they have (an HTML audio element, AVPlayer,
//! ExoPlayer, a rodio sink). The engine prepares one session per player
//! instance, drives it through the control calls below, and consumes the
//! session's [`MediaEvent`] channel in place of element callbacks.

use crate::error::Result;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for media sessions managed by a host backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaSessionId(Uuid);

impl MediaSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MediaSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MediaSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Request describing the media resource a backend should prepare.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    /// Fully-qualified URL of the audio resource.
    pub locator: String,
    /// Initial volume (0.0 = silent, 1.0 = unity gain).
    pub initial_volume: f32,
    /// Whether the session starts muted.
    pub muted: bool,
    /// Arbitrary display metadata (version name, reference) for host media sessions.
    pub metadata: HashMap<String, String>,
}

impl MediaRequest {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            initial_volume: 1.0,
            muted: false,
            metadata: HashMap::new(),
        }
    }

    pub fn with_volume(mut self, volume: f32, muted: bool) -> Self {
        self.initial_volume = volume;
        self.muted = muted;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Notifications a backend pushes for a prepared session.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Periodic position report while playing.
    TimeUpdate { position_secs: f64 },
    /// Playback reached the end of the resource.
    Ended,
    /// Transport or decode failure after the session was prepared.
    Failed { message: String },
}

/// A session that finished loading and is ready to play.
#[derive(Debug)]
pub struct PreparedMedia {
    pub session: MediaSessionId,
    /// Total length of the resource in seconds.
    pub duration_secs: f64,
    /// Event stream for this session; closed when the session is unloaded.
    pub events: mpsc::UnboundedReceiver<MediaEvent>,
}

/// Host media primitive.
///
/// `prepare` resolves only once the resource is ready for playback (the
/// equivalent of a `loadeddata` callback) and fails if the resource cannot be
/// loaded. Control calls on an unknown session should return
/// [`BridgeError::SessionNotFound`](crate::error::BridgeError::SessionNotFound).
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Load the resource and wait until it is playable.
    async fn prepare(&self, request: MediaRequest) -> Result<PreparedMedia>;

    /// Begin or resume playback.
    async fn play(&self, session: MediaSessionId) -> Result<()>;

    /// Pause playback without releasing the session.
    async fn pause(&self, session: MediaSessionId) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, session: MediaSessionId, position_secs: f64) -> Result<()>;

    /// Adjust volume, normalized to `0.0..=1.0`.
    async fn set_volume(&self, session: MediaSessionId, volume: f32) -> Result<()>;

    /// Mute or unmute without touching the volume level.
    async fn set_muted(&self, session: MediaSessionId, muted: bool) -> Result<()>;

    /// Stop playback and release every resource held by the session.
    async fn unload(&self, session: MediaSessionId) -> Result<()>;
}
