//! # Player State
//!
//! The player's lifecycle as a single enum plus the read-only snapshot hosts
//! render from.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::availability::Availability;

// ============================================================================
// Player State
// ============================================================================

/// Lifecycle of one player instance.
///
/// ```text
/// Uninitialized → CheckingAvailability → Unavailable
///                                      → Available → Loading → Ready → Playing ⇄ Paused
///                                                                       Playing → Ended
/// ```
///
/// `Error` is reachable from `Loading`, `Ready`, `Playing` and `Paused`.
/// `Uninitialized` is re-entered whenever the reference or version changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlayerState {
    Uninitialized,
    CheckingAvailability,
    Unavailable,
    Available,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error { message: String },
}

impl PlayerState {
    /// Lower-case name used in `StateChanged` events.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Uninitialized => "uninitialized",
            PlayerState::CheckingAvailability => "checking_availability",
            PlayerState::Unavailable => "unavailable",
            PlayerState::Available => "available",
            PlayerState::Loading => "loading",
            PlayerState::Ready => "ready",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Ended => "ended",
            PlayerState::Error { .. } => "error",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::Playing)
    }

    /// Work is in flight and the play control should show a spinner.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            PlayerState::CheckingAvailability | PlayerState::Loading
        )
    }

    /// A media session is prepared in this state.
    pub fn has_media(&self) -> bool {
        matches!(
            self,
            PlayerState::Ready | PlayerState::Playing | PlayerState::Paused | PlayerState::Ended
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PlayerState::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Degraded conditions a player can be in.
///
/// Only the media failures surface as the user-facing `error` string; the
/// others are diagnostics the host may show next to the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCondition {
    /// The reference has no chapter number.
    IncompleteReference,
    /// The version has no recording for this chapter.
    AudioUnavailable,
    /// Audio plays but verse timing could not be loaded.
    TimingUnavailable,
    /// Locator resolution or media preparation failed.
    MediaLoadFailure,
    /// The media primitive failed after loading.
    MediaPlaybackFailure,
}

impl EngineCondition {
    /// Whether the condition sets the user-facing error string.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EngineCondition::MediaLoadFailure | EngineCondition::MediaPlaybackFailure
        )
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of a player, suitable for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub instance_id: String,
    pub version_id: u32,
    pub reference: String,
    pub state: PlayerState,
    pub is_loading: bool,
    pub is_playing: bool,
    pub error: Option<String>,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    /// USFM id of the verse under the playhead.
    pub current_verse: Option<String>,
    /// Display label for `current_verse`, e.g. `"John 3:17"`.
    pub current_verse_label: Option<String>,
    pub volume: f32,
    pub muted: bool,
    pub incomplete_reference: bool,
    pub timing_unavailable: bool,
    pub availability: Availability,
    pub conditions: Vec<EngineCondition>,
}

impl PlayerSnapshot {
    /// Explanatory text for the most relevant non-error condition.
    pub fn diagnostic(&self) -> Option<String> {
        if self.incomplete_reference {
            let book = self.reference.trim();
            return Some(format!(
                "Incomplete reference: \"{book}\". Please include a chapter number (e.g., \"{book} 1\")."
            ));
        }

        if self.availability == Availability::Unavailable {
            return Some("Audio is not available for this version".to_string());
        }

        if self.timing_unavailable {
            return Some("Verse timing unavailable; verse highlighting is disabled".to_string());
        }

        None
    }

    /// `"m:ss / m:ss"` progress label.
    pub fn progress_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time_secs),
            format_time(self.duration_secs)
        )
    }
}

/// Format seconds as `m:ss`. Negative or non-finite input renders `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
