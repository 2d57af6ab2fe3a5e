//! # Engine Configuration Module
//!
//! Provides configuration management for the scripture audio engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `EngineConfig` instance that holds every bridge and setting the engine
//! needs. It enforces fail-fast validation so a host learns about a missing
//! bridge at startup instead of on the first play.
//!
//! ## Required Dependencies
//!
//! - `MediaBackend` - The host's media primitive (no platform default exists)
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, a `ReqwestHttpClient` is
//! injected automatically if no client is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ApiStyle, EngineConfig};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::builder()
//!     .audio_api_base_url("https://bibles.example.com/api/audio")
//!     .api_style(ApiStyle::Proxy)
//!     .media_backend(Arc::new(MyMediaBackend))
//!     .default_volume(0.7)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//!
//! // Fails with Error::CapabilityMissing { capability: "MediaBackend", .. }
//! let config = EngineConfig::builder().build();
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, MediaBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Public audio-bible service used when no base URL is configured.
pub const DEFAULT_AUDIO_API_BASE: &str = "https://audio-bible.youversionapistaging.com/3.1";

/// User agent sent with every audio metadata request.
pub const DEFAULT_USER_AGENT: &str = concat!("scripture-audio/", env!("CARGO_PKG_VERSION"));

/// Initial volume for new player instances.
pub const DEFAULT_VOLUME: f32 = 0.7;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// URL layout of the audio metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// Same-origin proxy: `{base}/{version_id}/{chapter_ref}`.
    Proxy,
    /// Upstream service: `{base}/chapter.json?version_id=..&reference=..`.
    #[default]
    Direct,
}

/// Where and how audio metadata is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioApiConfig {
    pub base_url: String,
    pub style: ApiStyle,
    pub user_agent: String,
    /// Per-request timeout.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for AudioApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AUDIO_API_BASE.to_string(),
            style: ApiStyle::Direct,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl AudioApiConfig {
    /// Validates the endpoint settings.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("Audio API base URL cannot be empty".to_string()));
        }
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(Error::Config(format!(
                "Audio API base URL must be absolute (http:// or https://), got '{}'",
                base
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Engine configuration.
///
/// Holds all bridges and settings required to build a comparison session.
/// Use [`EngineConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Audio metadata endpoint
    pub audio_api: AudioApiConfig,

    /// Volume new players start at (0.0..=1.0)
    pub default_volume: f32,

    /// Event bus buffer size
    pub event_buffer_size: usize,

    /// HTTP client used by the audio metadata connector
    pub http_client: Arc<dyn HttpClient>,

    /// Host media primitive (required)
    pub media_backend: Arc<dyn MediaBackend>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("audio_api", &self.audio_api)
            .field("default_volume", &self.default_volume)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("media_backend", &"MediaBackend { ... }")
            .finish()
    }
}

impl EngineConfig {
    /// Creates a new builder for constructing an `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The audio API endpoint is absolute and has a user agent
    /// - Default volume lies in `0.0..=1.0`
    /// - Event buffer size is reasonable (> 0 and <= 10,000)
    pub fn validate(&self) -> Result<()> {
        self.audio_api.validate()?;

        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(Error::Config(format!(
                "Default volume must be between 0.0 and 1.0, got {}",
                self.default_volume
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

fn media_backend_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaBackend".to_string(),
        message: "MediaBackend implementation is required for audio playback. \
                 Web: wrap an HTMLAudioElement. \
                 Mobile: wrap AVPlayer/ExoPlayer. \
                 Desktop: wrap the host's audio output (e.g. a rodio sink)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout).map_err(|e| {
        Error::Internal(format!("Failed to create default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to fetch audio metadata. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Web/Mobile: inject the host's fetch/URLSession/OkHttp client."
            .to_string(),
    })
}

/// Builder for constructing [`EngineConfig`] instances.
#[derive(Default)]
pub struct EngineConfigBuilder {
    audio_api: AudioApiConfig,
    default_volume: Option<f32>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    media_backend: Option<Arc<dyn MediaBackend>>,
}

impl EngineConfigBuilder {
    /// Sets the audio metadata base URL.
    ///
    /// Default: [`DEFAULT_AUDIO_API_BASE`]
    pub fn audio_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.audio_api.base_url = url.into();
        self
    }

    /// Sets the URL layout of the audio metadata service.
    ///
    /// Default: [`ApiStyle::Direct`]
    pub fn api_style(mut self, style: ApiStyle) -> Self {
        self.audio_api.style = style;
        self
    }

    /// Sets the user agent sent with metadata requests.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.audio_api.user_agent = agent.into();
        self
    }

    /// Sets the per-request HTTP timeout.
    ///
    /// Default: 30 seconds
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.audio_api.timeout = timeout;
        self
    }

    /// Replaces the whole audio API section at once.
    pub fn audio_api(mut self, config: AudioApiConfig) -> Self {
        self.audio_api = config;
        self
    }

    /// Sets the volume new players start at.
    ///
    /// Default: 0.7
    pub fn default_volume(mut self, volume: f32) -> Self {
        self.default_volume = Some(volume);
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`]
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the media backend implementation (required).
    pub fn media_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.media_backend = Some(backend);
        self
    }

    /// Builds the final `EngineConfig` instance.
    ///
    /// Returns an error if:
    /// - The media backend is missing
    /// - No HTTP client was given and no platform default exists
    /// - Configuration values are invalid
    pub fn build(self) -> Result<EngineConfig> {
        let media_backend = self.media_backend.ok_or_else(media_backend_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(self.audio_api.timeout)?,
        };

        let config = EngineConfig {
            audio_api: self.audio_api,
            default_volume: self.default_volume.unwrap_or(DEFAULT_VOLUME),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            media_backend,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse, MediaRequest, MediaSessionId, PreparedMedia};
    use mockall::mock;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    mock! {
        Media {}

        #[async_trait]
        impl MediaBackend for Media {
            async fn prepare(&self, request: MediaRequest) -> BridgeResult<PreparedMedia>;
            async fn play(&self, session: MediaSessionId) -> BridgeResult<()>;
            async fn pause(&self, session: MediaSessionId) -> BridgeResult<()>;
            async fn seek(&self, session: MediaSessionId, position_secs: f64) -> BridgeResult<()>;
            async fn set_volume(&self, session: MediaSessionId, volume: f32) -> BridgeResult<()>;
            async fn set_muted(&self, session: MediaSessionId, muted: bool) -> BridgeResult<()>;
            async fn unload(&self, session: MediaSessionId) -> BridgeResult<()>;
        }
    }

    fn builder_with_bridges() -> EngineConfigBuilder {
        EngineConfig::builder()
            .http_client(Arc::new(MockHttp::new()))
            .media_backend(Arc::new(MockMedia::new()))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder_with_bridges().build().unwrap();

        assert_eq!(config.audio_api.base_url, DEFAULT_AUDIO_API_BASE);
        assert_eq!(config.audio_api.style, ApiStyle::Direct);
        assert_eq!(config.audio_api.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.audio_api.timeout, Duration::from_secs(30));
        assert_eq!(config.default_volume, DEFAULT_VOLUME);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = builder_with_bridges()
            .audio_api_base_url("https://bibles.example.com/api/audio")
            .api_style(ApiStyle::Proxy)
            .user_agent("Bible-Directory-App/1.0")
            .http_timeout(Duration::from_secs(5))
            .default_volume(1.0)
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(config.audio_api.base_url, "https://bibles.example.com/api/audio");
        assert_eq!(config.audio_api.style, ApiStyle::Proxy);
        assert_eq!(config.audio_api.user_agent, "Bible-Directory-App/1.0");
        assert_eq!(config.audio_api.timeout, Duration::from_secs(5));
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_missing_media_backend() {
        let result = EngineConfig::builder()
            .http_client(Arc::new(MockHttp::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "MediaBackend");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_shims() {
        let result = EngineConfig::builder()
            .media_backend(Arc::new(MockMedia::new()))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "HttpClient"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_default_http_client_with_shims() {
        let result = EngineConfig::builder()
            .media_backend(Arc::new(MockMedia::new()))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let result = builder_with_bridges()
            .audio_api_base_url("/api/audio")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = builder_with_bridges().audio_api_base_url("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_volume_out_of_range_rejected() {
        assert!(matches!(
            builder_with_bridges().default_volume(1.5).build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            builder_with_bridges().default_volume(-0.1).build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_event_buffer_bounds() {
        assert!(matches!(
            builder_with_bridges().event_buffer_size(0).build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            builder_with_bridges().event_buffer_size(10_001).build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            builder_with_bridges().http_timeout(Duration::ZERO).build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_audio_api_config_serde_defaults() {
        let config: AudioApiConfig =
            serde_json::from_str(r#"{ "style": "proxy", "timeout": 10 }"#).unwrap();
        assert_eq!(config.style, ApiStyle::Proxy);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.base_url, DEFAULT_AUDIO_API_BASE);
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = builder_with_bridges().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("MediaBackend { ... }"));
        assert!(debug.contains("audio_api"));
    }
}
