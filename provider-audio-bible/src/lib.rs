//! # Audio Bible Provider
//!
//! Implements `AudioInfoSource` over HTTP for the audio-bible chapter service.
//!
//! ## Overview
//!
//! This crate provides:
//! - Chapter lookups through a same-origin proxy or the upstream service
//! - Media locator resolution across the response shapes the service emits
//! - Verse timing extraction
//! - Status and decoding failures mapped to [`AudioApiError`]

pub mod connector;
pub mod error;
pub mod types;

pub use connector::AudioBibleConnector;
pub use error::{AudioApiError, Result};
