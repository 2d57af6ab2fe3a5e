//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, media
//! playback) into the shared Rust core and manages the set of players a
//! comparison view mounts, one per version. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) so the HTTP
//! client defaults to reqwest.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::audio_info::AudioInfoSource;
use core_playback::{
    InstanceId, PlaybackController, PlaybackCoordinator, PlayerConfig, PlayerContext,
    PlayerOptions, PlayerSnapshot,
};
use core_runtime::config::EngineConfig;
use core_runtime::events::{EventBus, EventStream};
use core_scripture::Reference;
use parking_lot::Mutex;
use provider_audio_bible::AudioBibleConnector;
use tracing::{debug, info, warn};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop::ReqwestHttpClient;

/// Players shown side by side for one reference.
///
/// Owns the session's [`PlaybackCoordinator`] and event bus. Starting one
/// player through [`play`](Self::play) pauses whichever other player was
/// audible.
///
/// ```ignore
/// let config = EngineConfig::builder()
///     .audio_api_base_url("https://bibles.example.com/api/audio")
///     .api_style(ApiStyle::Proxy)
///     .media_backend(backend)
///     .build()?;
///
/// let session = ComparisonSession::new(config)?;
/// let niv = session.mount(111, true, "John 3:16").await?;
/// let kjv = session.mount(1, true, "John 3:16").await?;
/// session.play(niv.id()).await?;
/// session.play(kjv.id()).await?; // NIV pauses
/// ```
pub struct ComparisonSession {
    context: PlayerContext,
    players: Mutex<Vec<Arc<PlaybackController>>>,
}

impl ComparisonSession {
    /// Build a session that reads audio metadata from the configured API.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let connector = AudioBibleConnector::new(config.http_client.clone(), config.audio_api.clone());
        Self::with_audio_source(config, Arc::new(connector))
    }

    /// Build a session around a custom metadata source.
    pub fn with_audio_source(
        config: EngineConfig,
        audio_source: Arc<dyn AudioInfoSource>,
    ) -> Result<Self> {
        config.validate()?;

        let player_config = PlayerConfig::from_engine(&config);
        player_config.validate()?;

        info!(
            base_url = %config.audio_api.base_url,
            style = ?config.audio_api.style,
            "Comparison session created"
        );

        Ok(Self {
            context: PlayerContext {
                audio_source,
                media_backend: config.media_backend.clone(),
                coordinator: Arc::new(PlaybackCoordinator::new()),
                events: EventBus::new(config.event_buffer_size),
                config: player_config,
            },
            players: Mutex::new(Vec::new()),
        })
    }

    /// Replace the defaults applied to players mounted from now on.
    pub fn with_player_config(mut self, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        self.context.config = config;
        Ok(self)
    }

    /// Mount a player and probe its availability.
    pub async fn mount(
        &self,
        version_id: u32,
        has_audio: bool,
        reference: &str,
    ) -> Result<Arc<PlaybackController>> {
        self.mount_with(
            version_id,
            reference,
            PlayerOptions::default().with_has_audio(has_audio),
        )
        .await
    }

    pub async fn mount_with(
        &self,
        version_id: u32,
        reference: &str,
        options: PlayerOptions,
    ) -> Result<Arc<PlaybackController>> {
        let player = PlaybackController::new(
            self.context.clone(),
            version_id,
            Reference::parse(reference),
            options,
        )?;
        self.players.lock().push(player.clone());
        debug!(instance = %player.id(), version_id, reference, "Player mounted");

        player.refresh_availability().await?;
        Ok(player)
    }

    /// Dispose a player and forget it.
    pub async fn unmount(&self, id: InstanceId) -> Result<()> {
        let player = {
            let mut players = self.players.lock();
            let index = players
                .iter()
                .position(|p| p.id() == id)
                .ok_or_else(|| CoreError::UnknownPlayer(id.to_string()))?;
            players.remove(index)
        };

        player.dispose().await;
        debug!(instance = %id, "Player unmounted");
        Ok(())
    }

    pub fn player(&self, id: InstanceId) -> Option<Arc<PlaybackController>> {
        self.players.lock().iter().find(|p| p.id() == id).cloned()
    }

    pub fn players(&self) -> Vec<Arc<PlaybackController>> {
        self.players.lock().clone()
    }

    fn require(&self, id: InstanceId) -> Result<Arc<PlaybackController>> {
        self.player(id)
            .ok_or_else(|| CoreError::UnknownPlayer(id.to_string()))
    }

    /// Start one player, then let every other player react to it.
    pub async fn play(&self, id: InstanceId) -> Result<()> {
        self.require(id)?.play().await?;
        self.relay_silencing().await;
        Ok(())
    }

    pub async fn pause(&self, id: InstanceId) -> Result<()> {
        self.require(id)?.pause().await?;
        Ok(())
    }

    async fn relay_silencing(&self) {
        for player in self.players() {
            if let Err(e) = player.observe_coordinator().await {
                warn!(instance = %player.id(), error = %e, "Failed to apply pause request");
            }
        }
    }

    /// Point every player at a new reference and probe again.
    pub async fn set_reference_all(&self, text: &str) -> Result<()> {
        let reference = Reference::parse(text);
        info!(reference = %reference, "Changing reference for all players");

        for player in self.players() {
            player.set_reference(reference.clone()).await?;
            player.refresh_availability().await?;
        }
        Ok(())
    }

    pub fn currently_playing(&self) -> Option<InstanceId> {
        self.context.coordinator.current()
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players().iter().map(|p| p.snapshot()).collect()
    }

    /// Events from every mounted player.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.context.events.subscribe())
    }

    /// Dispose every player.
    pub async fn shutdown(&self) {
        let players = std::mem::take(&mut *self.players.lock());
        for player in players {
            player.dispose().await;
        }
        debug!("Comparison session shut down");
    }
}
