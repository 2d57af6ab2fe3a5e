//! # Playback Error Types
//!
//! Errors returned by player operations. Failures that the player absorbs
//! into its own state (missing timing, unavailable audio) are not errors
//! here; see [`EngineCondition`](crate::state::EngineCondition).

use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Media Errors
    // ========================================================================
    /// The media locator could not be resolved or the resource failed to load.
    #[error("Failed to load media: {0}")]
    MediaLoad(String),

    /// The media primitive rejected a playback command.
    #[error("Media playback failed: {0}")]
    MediaPlayback(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Attempted an operation that needs a prepared media session.
    #[error("No media loaded")]
    NoMediaLoaded,

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// The controller was disposed and accepts no further commands.
    #[error("Player has been disposed")]
    Disposed,

    // ========================================================================
    // Platform/Adapter Errors
    // ========================================================================
    /// Error reported by a host bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Invalid player configuration.
    #[error("Invalid player configuration: {0}")]
    Config(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if calling `play()` again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::MediaLoad(_) | PlaybackError::MediaPlayback(_) | PlaybackError::Bridge(_)
        )
    }

    /// Returns `true` if the host called an operation it should not have.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoMediaLoaded | PlaybackError::InvalidVolume(_) | PlaybackError::Disposed
        )
    }

    /// Returns `true` if this error originates from the media primitive.
    pub fn is_media_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::MediaLoad(_) | PlaybackError::MediaPlayback(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
