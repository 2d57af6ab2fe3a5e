//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-scripture`, `core-playback`).
//! Host applications can depend on `scripture-audio-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(feature = "engine")]
pub use core_playback as playback;
#[cfg(feature = "engine")]
pub use core_scripture as scripture;
#[cfg(any(feature = "engine", feature = "desktop-shims"))]
pub use core_service as service;
