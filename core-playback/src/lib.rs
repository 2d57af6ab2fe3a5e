//! # Playback Module
//!
//! Per-version audio players for a scripture reference.
//!
//! ## Overview
//!
//! This crate handles:
//! - Availability probing before any media is loaded
//! - Loading a chapter recording and its verse timing concurrently
//! - The player state machine and transport controls
//! - Tracking the verse under the playhead
//! - Coordinating players so only one is audible at a time
//!
//! Audio decoding and output belong to the host's
//! [`MediaBackend`](bridge_traits::media::MediaBackend).

pub mod availability;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod state;
pub mod timing;

pub use availability::{Availability, AvailabilityProbe, ProbeOutcome};
pub use config::PlayerConfig;
pub use controller::{PlaybackController, PlayerContext, PlayerOptions};
pub use coordinator::{InstanceId, PlaybackCoordinator};
pub use cursor::{VerseChange, VerseCursor};
pub use error::{PlaybackError, Result};
pub use state::{format_time, EngineCondition, PlayerSnapshot, PlayerState};
pub use timing::{TimingError, TimingIndex, VerseBounds, VerseMarker};
