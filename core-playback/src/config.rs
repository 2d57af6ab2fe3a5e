//! # Player Configuration
//!
//! Per-controller defaults. Engine-wide values (API endpoint, bridges) live in
//! `core_runtime::config::EngineConfig`; [`PlayerConfig::from_engine`] carries
//! the relevant ones over.

use core_runtime::config::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};

/// Message shown to users when media cannot be loaded or played.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load audio";

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume applied to every newly prepared session.
    ///
    /// Default: 0.7.
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Whether new players start muted.
    ///
    /// Default: false.
    #[serde(default)]
    pub start_muted: bool,

    /// Spawn a task per media session that forwards backend events to the
    /// controller. When disabled the host calls `pump_media_events()` itself.
    ///
    /// Default: true.
    #[serde(default = "default_spawn_event_pump")]
    pub spawn_event_pump: bool,

    /// Publish `PositionChanged` on every time update.
    ///
    /// Default: true.
    #[serde(default = "default_emit_position_events")]
    pub emit_position_events: bool,

    /// User-facing error string for media failures.
    #[serde(default = "default_error_message")]
    pub error_message: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            start_muted: false,
            spawn_event_pump: default_spawn_event_pump(),
            emit_position_events: default_emit_position_events(),
            error_message: default_error_message(),
        }
    }
}

impl PlayerConfig {
    /// Player defaults derived from the engine configuration.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            default_volume: config.default_volume,
            ..Default::default()
        }
    }

    /// Configuration for hosts and tests that drive media events by hand.
    pub fn manual_events() -> Self {
        Self {
            spawn_event_pump: false,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(PlaybackError::InvalidVolume(self.default_volume));
        }

        if self.error_message.trim().is_empty() {
            return Err(PlaybackError::Config(
                "error_message cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_volume() -> f32 {
    core_runtime::config::DEFAULT_VOLUME
}

fn default_spawn_event_pump() -> bool {
    true
}

fn default_emit_position_events() -> bool {
    true
}

fn default_error_message() -> String {
    LOAD_ERROR_MESSAGE.to_string()
}
