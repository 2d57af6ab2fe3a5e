//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the scripture audio engine and the
//! collaborators it does not own. Each trait represents a capability the
//! engine requires but that is provided differently per host (desktop shell,
//! web view, mobile app).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//! - [`AudioInfoSource`](audio_info::AudioInfoSource) - Audio metadata (timing table + media locator) per chapter
//!
//! ### Media
//! - [`MediaBackend`](media::MediaBackend) - The host's media-playback primitive
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Capability      | Desktop                          | Web / Mobile            |
//! |-----------------|----------------------------------|-------------------------|
//! | `HttpClient`    | `bridge-desktop` (reqwest)       | host-injected           |
//! | `AudioInfoSource` | `provider-audio-bible`         | `provider-audio-bible`  |
//! | `MediaBackend`  | host-injected                    | host-injected           |
//!
//! ## Fail-Fast Strategy
//!
//! The engine fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .audio_api_base_url("/api/audio")
//!     .build()?; // Error::CapabilityMissing { capability: "MediaBackend", .. }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and include actionable context (URL, status, session id).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so the engine can share them
//! across async tasks behind `Arc`.

pub mod audio_info;
pub mod error;
pub mod http;
pub mod logging;
pub mod media;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio_info::{normalize_media_locator, AudioInfo, AudioInfoSource, VerseTiming};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    MediaBackend, MediaEvent, MediaRequest, MediaSessionId, PreparedMedia,
};
