//! # Playback Controller
//!
//! One controller per mounted player. It owns a single media session, the
//! chapter's [`TimingIndex`] and a [`VerseCursor`], and drives the
//! [`PlayerState`] machine in response to host commands and media events.
//!
//! ## Concurrency
//!
//! All state sits behind one `parking_lot::Mutex` that is never held across
//! an `.await`. Every suspension point captures the input generation first;
//! a result that comes back after the reference or version changed is
//! dropped, and a media session prepared in the meantime is unloaded.
//!
//! ## Usage
//!
//! ```ignore
//! let controller = PlaybackController::new(context, 111, Reference::parse("John 3:16"), PlayerOptions::default())?;
//! controller.refresh_availability().await?;
//! controller.play().await?;
//! controller.seek(42.0).await?;
//! ```

use bridge_traits::audio_info::{normalize_media_locator, AudioInfoSource};
use bridge_traits::media::{MediaBackend, MediaEvent, MediaRequest, MediaSessionId, PreparedMedia};
use core_runtime::events::{AvailabilityEvent, CoreEvent, EventBus, PlaybackEvent};
use core_scripture::Reference;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::availability::{fetch_media_locator, Availability, AvailabilityProbe, ProbeOutcome};
use crate::config::PlayerConfig;
use crate::coordinator::{InstanceId, PlaybackCoordinator};
use crate::cursor::{VerseChange, VerseCursor};
use crate::error::{PlaybackError, Result};
use crate::state::{EngineCondition, PlayerSnapshot, PlayerState};
use crate::timing::{TimingIndex, VerseMarker};

// ============================================================================
// Construction Inputs
// ============================================================================

/// Collaborators shared by every controller in a session.
#[derive(Clone)]
pub struct PlayerContext {
    pub audio_source: Arc<dyn AudioInfoSource>,
    pub media_backend: Arc<dyn MediaBackend>,
    pub coordinator: Arc<PlaybackCoordinator>,
    pub events: EventBus,
    pub config: PlayerConfig,
}

/// Per-player options.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Versions without a recording get an inert player.
    pub has_audio: bool,
    /// Play this URL instead of resolving one from the audio service.
    /// Availability is still checked.
    pub direct_locator: Option<String>,
    /// Verse to start from instead of the reference's verse.
    pub target_verse: Option<String>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            has_audio: true,
            direct_locator: None,
            target_verse: None,
        }
    }
}

impl PlayerOptions {
    pub fn with_has_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    pub fn with_direct_locator(mut self, locator: impl Into<String>) -> Self {
        self.direct_locator = Some(locator.into());
        self
    }

    pub fn with_target_verse(mut self, verse_usfm: impl Into<String>) -> Self {
        self.target_verse = Some(verse_usfm.into());
        self
    }
}

// ============================================================================
// Internal State
// ============================================================================

struct LoadedMedia {
    session: MediaSessionId,
    /// `None` when the backend could not report a finite duration.
    duration_secs: Option<f64>,
    /// Held here only when the host pumps events by hand.
    events: Option<mpsc::UnboundedReceiver<MediaEvent>>,
}

struct ControllerInner {
    version_id: u32,
    reference: Reference,
    has_audio: bool,
    direct_locator: Option<String>,
    target_verse: Option<String>,
    state: PlayerState,
    availability: Availability,
    failure: Option<EngineCondition>,
    generation: u64,
    media: Option<LoadedMedia>,
    cursor: VerseCursor,
    current_time_secs: f64,
    volume: f32,
    muted: bool,
    timing_unavailable: bool,
    should_pause: bool,
    disposed: bool,
}

impl ControllerInner {
    fn session(&self) -> Option<MediaSessionId> {
        self.media.as_ref().map(|m| m.session)
    }

    fn duration(&self) -> Option<f64> {
        self.media.as_ref().and_then(|m| m.duration_secs)
    }
}

enum PlayAction {
    Nothing,
    Load(u64),
    Resume {
        session: MediaSessionId,
        generation: u64,
        rewind: bool,
    },
}

fn clamp_position(position: f64, duration: Option<f64>) -> f64 {
    if position.is_nan() {
        return 0.0;
    }
    match duration {
        Some(duration) => position.clamp(0.0, duration),
        None => position.max(0.0),
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Audio player for one version of one reference.
pub struct PlaybackController {
    id: InstanceId,
    inner: Mutex<ControllerInner>,
    source: Arc<dyn AudioInfoSource>,
    probe: AvailabilityProbe,
    media: Arc<dyn MediaBackend>,
    coordinator: Arc<PlaybackCoordinator>,
    events: EventBus,
    config: PlayerConfig,
    weak_self: Weak<PlaybackController>,
}

impl PlaybackController {
    /// Create a controller in `Uninitialized`.
    pub fn new(
        context: PlayerContext,
        version_id: u32,
        reference: Reference,
        options: PlayerOptions,
    ) -> Result<Arc<Self>> {
        context.config.validate()?;

        let PlayerContext {
            audio_source,
            media_backend,
            coordinator,
            events,
            config,
        } = context;

        let inner = ControllerInner {
            version_id,
            reference,
            has_audio: options.has_audio,
            direct_locator: options.direct_locator,
            target_verse: options.target_verse,
            state: PlayerState::Uninitialized,
            availability: Availability::Undetermined,
            failure: None,
            generation: 0,
            media: None,
            cursor: VerseCursor::new(),
            current_time_secs: 0.0,
            volume: config.default_volume,
            muted: config.start_muted,
            timing_unavailable: false,
            should_pause: false,
            disposed: false,
        };

        Ok(Arc::new_cyclic(|weak_self| Self {
            id: InstanceId::new(),
            inner: Mutex::new(inner),
            probe: AvailabilityProbe::new(audio_source.clone()),
            source: audio_source,
            media: media_backend,
            coordinator,
            events,
            config,
            weak_self: weak_self.clone(),
        }))
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn version_id(&self) -> u32 {
        self.inner.lock().version_id
    }

    pub fn reference(&self) -> Reference {
        self.inner.lock().reference.clone()
    }

    pub fn state(&self) -> PlayerState {
        self.inner.lock().state.clone()
    }

    pub fn current_verse(&self) -> Option<String> {
        self.inner.lock().cursor.current().map(str::to_string)
    }

    /// Verse ticks for the loaded chapter; empty without timing or duration.
    pub fn markers(&self) -> Vec<VerseMarker> {
        let inner = self.inner.lock();
        match (inner.cursor.index(), inner.duration()) {
            (Some(index), Some(duration)) => index.markers(duration),
            _ => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.inner.lock();
        let current_verse = inner.cursor.current().map(str::to_string);
        let current_verse_label = current_verse
            .as_deref()
            .map(|usfm| inner.reference.display_with_verse(usfm));

        PlayerSnapshot {
            instance_id: self.id.to_string(),
            version_id: inner.version_id,
            reference: inner.reference.raw_text().to_string(),
            state: inner.state.clone(),
            is_loading: inner.state.is_loading(),
            is_playing: inner.state.is_playing(),
            error: inner.state.error_message().map(str::to_string),
            current_time_secs: inner.current_time_secs,
            duration_secs: inner.duration().unwrap_or(0.0),
            current_verse,
            current_verse_label,
            volume: inner.volume,
            muted: inner.muted,
            incomplete_reference: inner.reference.is_incomplete(),
            timing_unavailable: inner.timing_unavailable,
            availability: inner.availability,
            conditions: Self::conditions(&inner),
        }
    }

    fn conditions(inner: &ControllerInner) -> Vec<EngineCondition> {
        let mut conditions = Vec::new();
        if inner.reference.is_incomplete() {
            conditions.push(EngineCondition::IncompleteReference);
        }
        if inner.availability == Availability::Unavailable {
            conditions.push(EngineCondition::AudioUnavailable);
        }
        if inner.timing_unavailable {
            conditions.push(EngineCondition::TimingUnavailable);
        }
        conditions.extend(inner.failure);
        conditions
    }

    fn ensure_active(&self, inner: &ControllerInner) -> Result<()> {
        if inner.disposed {
            return Err(PlaybackError::Disposed);
        }
        Ok(())
    }

    // ========================================================================
    // Event Publishing
    // ========================================================================

    fn emit(&self, event: CoreEvent) {
        // No subscribers is not an error for the player.
        self.events.emit(event).ok();
    }

    /// Move to `next`, publishing the state change and, when audibility
    /// flips, updating the coordinator and the play-state notification.
    fn transition(&self, inner: &mut ControllerInner, next: PlayerState) {
        if inner.state == next {
            return;
        }

        let was_playing = inner.state.is_playing();
        debug!(instance = %self.id, from = %inner.state, to = %next, "State transition");
        inner.state = next;

        self.emit(CoreEvent::Playback(PlaybackEvent::StateChanged {
            instance_id: self.id.to_string(),
            version_id: inner.version_id,
            state: inner.state.name().to_string(),
        }));

        let playing = inner.state.is_playing();
        if playing == was_playing {
            return;
        }

        if playing {
            inner.should_pause = false;
            self.coordinator.on_start(self.id);
        } else {
            self.coordinator.on_stop(self.id);
        }

        self.emit(CoreEvent::Playback(PlaybackEvent::PlayStateChanged {
            instance_id: self.id.to_string(),
            version_id: inner.version_id,
            is_playing: playing,
        }));
    }

    fn publish_verse(&self, inner: &ControllerInner, change: Option<VerseChange>) {
        let Some(change) = change else {
            return;
        };

        let label = change
            .current
            .as_deref()
            .map(|usfm| inner.reference.display_with_verse(usfm));

        self.emit(CoreEvent::Playback(PlaybackEvent::VerseChanged {
            instance_id: self.id.to_string(),
            version_id: inner.version_id,
            verse_usfm: change.current,
            label,
        }));
    }

    fn publish_position(&self, inner: &ControllerInner) {
        if !self.config.emit_position_events {
            return;
        }

        self.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
            instance_id: self.id.to_string(),
            position_secs: inner.current_time_secs,
            duration_secs: inner.duration().unwrap_or(0.0),
        }));
    }

    /// Enter `Error`, releasing the session. Returns the session to unload.
    fn fail(&self, inner: &mut ControllerInner, condition: EngineCondition) -> Option<MediaSessionId> {
        inner.failure = Some(condition);
        let session = inner.media.take().map(|m| m.session);
        let change = inner.cursor.clear();
        self.publish_verse(inner, change);

        let message = self.config.error_message.clone();
        self.transition(
            inner,
            PlayerState::Error {
                message: message.clone(),
            },
        );

        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            instance_id: self.id.to_string(),
            version_id: inner.version_id,
            message,
            recoverable: true,
        }));

        session
    }

    /// Drop all media state and return to `Uninitialized`. Returns the
    /// session to unload.
    fn reset(&self, inner: &mut ControllerInner) -> Option<MediaSessionId> {
        inner.generation += 1;
        let session = inner.media.take().map(|m| m.session);
        let change = inner.cursor.clear();
        self.publish_verse(inner, change);

        inner.current_time_secs = 0.0;
        inner.availability = Availability::Undetermined;
        inner.timing_unavailable = false;
        inner.failure = None;
        self.transition(inner, PlayerState::Uninitialized);

        session
    }

    async fn release(&self, session: Option<MediaSessionId>) {
        let Some(session) = session else {
            return;
        };

        if let Err(e) = self.media.unload(session).await {
            warn!(instance = %self.id, session = %session, error = %e, "Failed to unload media session");
        }
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Change the reference. Any loaded media is torn down.
    pub async fn set_reference(&self, reference: Reference) -> Result<()> {
        self.update_inputs(None, Some(reference)).await
    }

    /// Change the version. Any loaded media is torn down.
    pub async fn set_version(&self, version_id: u32) -> Result<()> {
        self.update_inputs(Some(version_id), None).await
    }

    pub async fn set_inputs(&self, version_id: u32, reference: Reference) -> Result<()> {
        self.update_inputs(Some(version_id), Some(reference)).await
    }

    async fn update_inputs(&self, version_id: Option<u32>, reference: Option<Reference>) -> Result<()> {
        let session = {
            let mut inner = self.inner.lock();
            self.ensure_active(&inner)?;

            let version_changed = version_id.is_some_and(|v| v != inner.version_id);
            let reference_changed = reference
                .as_ref()
                .is_some_and(|r| r.raw_text().trim() != inner.reference.raw_text().trim());

            if !version_changed && !reference_changed {
                return Ok(());
            }

            if let Some(version_id) = version_id {
                inner.version_id = version_id;
            }
            if let Some(reference) = reference {
                inner.reference = reference;
            }

            info!(
                instance = %self.id,
                version_id = inner.version_id,
                reference = %inner.reference,
                "Player inputs changed"
            );
            self.reset(&mut inner)
        };

        self.release(session).await;
        Ok(())
    }

    /// Mark whether the version has audio at all. Turning it off tears down.
    pub async fn set_has_audio(&self, has_audio: bool) -> Result<()> {
        let session = {
            let mut inner = self.inner.lock();
            self.ensure_active(&inner)?;
            if inner.has_audio == has_audio {
                return Ok(());
            }
            inner.has_audio = has_audio;
            self.reset(&mut inner)
        };

        self.release(session).await;
        Ok(())
    }

    /// Jump to a verse. Applied now when media and timing are loaded,
    /// otherwise used as the starting point of the next load.
    pub async fn set_target_verse(&self, verse_usfm: Option<String>) -> Result<()> {
        let start = {
            let mut inner = self.inner.lock();
            self.ensure_active(&inner)?;
            inner.target_verse = verse_usfm;

            match (inner.target_verse.as_deref(), inner.session(), inner.cursor.index()) {
                (Some(usfm), Some(_), Some(index)) => index.bounds_of(usfm).map(|b| b.start),
                _ => None,
            }
        };

        if let Some(start) = start {
            self.seek(start).await?;
        }
        Ok(())
    }

    /// Host input: pause when this flips from false to true.
    pub async fn set_should_pause(&self, should_pause: bool) -> Result<()> {
        let rising = {
            let mut inner = self.inner.lock();
            self.ensure_active(&inner)?;
            let rising = should_pause && !inner.should_pause;
            inner.should_pause = should_pause;
            rising
        };

        if rising {
            debug!(instance = %self.id, "Asked to pause");
            self.pause().await?;
        }
        Ok(())
    }

    /// Pause once when another player starts. Returns whether it paused.
    pub async fn observe_coordinator(&self) -> Result<bool> {
        let silenced = self.coordinator.should_be_silenced(self.id);
        let was_playing = self.inner.lock().state.is_playing();
        self.set_should_pause(silenced).await?;
        Ok(silenced && was_playing && !self.inner.lock().state.is_playing())
    }

    /// Follow the coordinator in a background task until the controller is
    /// dropped or disposed.
    pub fn watch_coordinator(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut updates = self.coordinator.subscribe();

        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                match controller.observe_coordinator().await {
                    Ok(_) => {}
                    Err(PlaybackError::Disposed) => break,
                    Err(e) => warn!(instance = %controller.id, error = %e, "Failed to follow coordinator"),
                }
            }
        })
    }

    // ========================================================================
    // Availability
    // ========================================================================

    /// Probe availability for the current inputs when idle.
    pub async fn refresh_availability(&self) -> Result<Availability> {
        let generation = {
            let inner = self.inner.lock();
            self.ensure_active(&inner)?;
            let idle = matches!(
                inner.state,
                PlayerState::Uninitialized | PlayerState::Unavailable | PlayerState::Available
            );
            if !inner.has_audio || !idle {
                return Ok(inner.availability);
            }
            inner.generation
        };

        Ok(self
            .run_probe(generation)
            .await
            .unwrap_or(Availability::Undetermined))
    }

    /// `None` when the inputs changed while probing.
    async fn run_probe(&self, generation: u64) -> Option<Availability> {
        let (version_id, reference) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return None;
            }

            if inner.reference.is_incomplete() {
                debug!(instance = %self.id, reference = %inner.reference, "Reference has no chapter");
                inner.availability = Availability::Undetermined;
                self.emit(CoreEvent::Availability(AvailabilityEvent::IncompleteReference {
                    instance_id: self.id.to_string(),
                    version_id: inner.version_id,
                    reference: inner.reference.raw_text().to_string(),
                }));
                return Some(Availability::Undetermined);
            }

            self.transition(&mut inner, PlayerState::CheckingAvailability);
            (inner.version_id, inner.reference.clone())
        };

        let outcome = self.probe.check(version_id, &reference).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(instance = %self.id, "Discarding stale availability result");
            return None;
        }

        let availability = match outcome {
            ProbeOutcome::Resolved(availability) => availability,
            ProbeOutcome::Superseded => return None,
        };

        inner.availability = availability;
        let next = match availability {
            Availability::Available => PlayerState::Available,
            Availability::Unavailable => PlayerState::Unavailable,
            Availability::Undetermined => PlayerState::Uninitialized,
        };
        self.transition(&mut inner, next);

        self.emit(CoreEvent::Availability(AvailabilityEvent::Checked {
            instance_id: self.id.to_string(),
            version_id,
            chapter_ref: reference.chapter_usfm().unwrap_or_default(),
            available: availability == Availability::Available,
        }));

        Some(availability)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Start or resume playback.
    #[instrument(skip(self), fields(instance = %self.id))]
    pub async fn play(&self) -> Result<()> {
        let action = {
            let mut inner = self.inner.lock();
            self.ensure_active(&inner)?;

            if !inner.has_audio {
                debug!("Version has no audio");
                return Ok(());
            }

            let state = inner.state.clone();
            match inner.session() {
                Some(session) if state.has_media() && !state.is_playing() => {
                    let rewind = state == PlayerState::Ended;
                    if rewind {
                        inner.current_time_secs = 0.0;
                        let change = inner.cursor.observe(0.0);
                        self.publish_verse(&inner, change);
                        self.publish_position(&inner);
                    }
                    PlayAction::Resume {
                        session,
                        generation: inner.generation,
                        rewind,
                    }
                }
                _ if matches!(
                    state,
                    PlayerState::Uninitialized | PlayerState::Available | PlayerState::Error { .. }
                ) =>
                {
                    PlayAction::Load(inner.generation)
                }
                _ => PlayAction::Nothing,
            }
        };

        match action {
            PlayAction::Nothing => Ok(()),
            PlayAction::Load(generation) => self.load_and_play(generation).await,
            PlayAction::Resume {
                session,
                generation,
                rewind,
            } => {
                if rewind {
                    if let Err(e) = self.media.seek(session, 0.0).await {
                        warn!(error = %e, "Failed to rewind");
                    }
                }
                self.start_session(session, generation).await
            }
        }
    }

    async fn load_and_play(&self, generation: u64) -> Result<()> {
        let probed = {
            let inner = self.inner.lock();
            inner.state == PlayerState::Available && inner.availability == Availability::Available
        };

        if !probed && self.run_probe(generation).await != Some(Availability::Available) {
            return Ok(());
        }

        let (version_id, reference, direct_locator) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation || inner.state != PlayerState::Available {
                return Ok(());
            }
            inner.failure = None;
            self.transition(&mut inner, PlayerState::Loading);
            (
                inner.version_id,
                inner.reference.clone(),
                inner.direct_locator.clone(),
            )
        };

        let chapter_ref = reference.chapter_usfm().unwrap_or_default();
        info!(version_id, chapter_ref = %chapter_ref, "Loading chapter audio");

        let locator = async {
            match direct_locator {
                Some(locator) => Ok(normalize_media_locator(&locator)),
                None => fetch_media_locator(&*self.source, version_id, &chapter_ref).await,
            }
        };
        let timing = TimingIndex::load(&*self.source, version_id, &reference);
        let (locator, timing) = tokio::join!(locator, timing);

        let request = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!("Discarding stale load");
                return Ok(());
            }

            let locator = match locator {
                Ok(locator) => locator,
                Err(e) => {
                    warn!(error = %e, "Media locator resolution failed");
                    self.fail(&mut inner, EngineCondition::MediaLoadFailure);
                    return Err(PlaybackError::MediaLoad(e.to_string()));
                }
            };

            MediaRequest::new(locator)
                .with_volume(inner.volume, inner.muted)
                .with_metadata("version_id", version_id.to_string())
                .with_metadata("reference", reference.raw_text())
        };

        let timing = match timing {
            Ok(index) => Some(Arc::new(index)),
            Err(e) => {
                warn!(chapter_ref = %chapter_ref, error = %e, "Verse timing unavailable");
                None
            }
        };

        let prepared = match self.media.prepare(request).await {
            Ok(prepared) => prepared,
            Err(e) => {
                let mut inner = self.inner.lock();
                if inner.generation != generation {
                    return Ok(());
                }
                warn!(error = %e, "Media failed to load");
                self.fail(&mut inner, EngineCondition::MediaLoadFailure);
                return Err(PlaybackError::MediaLoad(e.to_string()));
            }
        };

        let PreparedMedia {
            session,
            duration_secs,
            events,
        } = prepared;

        let start = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                None
            } else {
                Some(self.install_media(&mut inner, generation, session, duration_secs, events, timing, &chapter_ref))
            }
        };

        let Some(start) = start else {
            debug!(session = %session, "Inputs changed during prepare, releasing session");
            self.release(Some(session)).await;
            return Ok(());
        };

        if start > 0.0 {
            if let Err(e) = self.media.seek(session, start).await {
                warn!(error = %e, "Initial seek failed");
            }
        }

        self.start_session(session, generation).await
    }

    /// Install a freshly prepared session and its timing. Returns the
    /// initial seek position.
    #[allow(clippy::too_many_arguments)]
    fn install_media(
        &self,
        inner: &mut ControllerInner,
        generation: u64,
        session: MediaSessionId,
        duration_secs: f64,
        events: mpsc::UnboundedReceiver<MediaEvent>,
        timing: Option<Arc<TimingIndex>>,
        chapter_ref: &str,
    ) -> f64 {
        let duration = (duration_secs.is_finite() && duration_secs >= 0.0).then_some(duration_secs);

        inner.timing_unavailable = timing.is_none();
        if timing.is_none() {
            self.emit(CoreEvent::Playback(PlaybackEvent::TimingUnavailable {
                instance_id: self.id.to_string(),
                version_id: inner.version_id,
                chapter_ref: chapter_ref.to_string(),
            }));
        }

        let start = timing
            .as_deref()
            .map(|index| {
                let wanted = inner
                    .target_verse
                    .clone()
                    .or_else(|| inner.reference.verse_usfm());
                wanted
                    .as_deref()
                    .and_then(|usfm| index.bounds_of(usfm))
                    .map(|bounds| bounds.start)
                    .unwrap_or_else(|| index.chapter_start())
            })
            .map(|start| clamp_position(start, duration))
            .unwrap_or(0.0);

        let events = if self.config.spawn_event_pump {
            self.spawn_event_pump(generation, events);
            None
        } else {
            Some(events)
        };

        inner.media = Some(LoadedMedia {
            session,
            duration_secs: duration,
            events,
        });
        inner.current_time_secs = start;

        let change = inner.cursor.install(timing, start);
        self.publish_verse(inner, change);
        self.transition(inner, PlayerState::Ready);

        debug!(session = %session, duration = ?duration, start, "Media ready");
        start
    }

    async fn start_session(&self, session: MediaSessionId, generation: u64) -> Result<()> {
        let result = self.media.play(session).await;

        let (outcome, released) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation || inner.session() != Some(session) {
                return Ok(());
            }

            match result {
                Ok(()) => {
                    if matches!(
                        inner.state,
                        PlayerState::Ready | PlayerState::Paused | PlayerState::Ended
                    ) {
                        self.transition(&mut inner, PlayerState::Playing);
                    }
                    (Ok(()), None)
                }
                Err(e) => {
                    warn!(error = %e, "Media refused to play");
                    let released = self.fail(&mut inner, EngineCondition::MediaPlaybackFailure);
                    (Err(PlaybackError::MediaPlayback(e.to_string())), released)
                }
            }
        };

        self.release(released).await;
        outcome
    }

    /// Pause if playing; otherwise a no-op.
    #[instrument(skip(self), fields(instance = %self.id))]
    pub async fn pause(&self) -> Result<()> {
        let session = {
            let mut inner = self.inner.lock();
            if !inner.state.is_playing() {
                return Ok(());
            }
            let Some(session) = inner.session() else {
                return Ok(());
            };
            self.transition(&mut inner, PlayerState::Paused);
            session
        };

        self.media.pause(session).await?;
        Ok(())
    }

    /// Seek to `position_secs`, clamped to the media's duration. Returns the
    /// applied position.
    pub async fn seek(&self, position_secs: f64) -> Result<f64> {
        let (session, position) = {
            let mut inner = self.inner.lock();
            let session = inner.session().ok_or(PlaybackError::NoMediaLoaded)?;
            let position = clamp_position(position_secs, inner.duration());

            inner.current_time_secs = position;
            let change = inner.cursor.observe(position);
            self.publish_verse(&inner, change);
            self.publish_position(&inner);

            // Resume from here rather than rewinding.
            if inner.state == PlayerState::Ended {
                self.transition(&mut inner, PlayerState::Paused);
            }
            (session, position)
        };

        self.media.seek(session, position).await?;
        Ok(position)
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }

        let session = {
            let mut inner = self.inner.lock();
            inner.volume = volume;
            inner.session()
        };

        if let Some(session) = session {
            self.media.set_volume(session, volume).await?;
        }
        Ok(())
    }

    pub async fn set_muted(&self, muted: bool) -> Result<()> {
        let session = {
            let mut inner = self.inner.lock();
            inner.muted = muted;
            inner.session()
        };

        if let Some(session) = session {
            self.media.set_muted(session, muted).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Media Events
    // ========================================================================

    /// Apply one media event to the current session.
    pub async fn handle_media_event(&self, event: MediaEvent) {
        let generation = self.inner.lock().generation;
        self.apply_media_event(generation, event).await;
    }

    /// Apply every event already queued by the backend. Only meaningful when
    /// `spawn_event_pump` is off. Returns how many events were drained.
    pub async fn pump_media_events(&self) -> usize {
        let (generation, queued) = {
            let mut inner = self.inner.lock();
            let generation = inner.generation;
            let mut queued = Vec::new();
            if let Some(events) = inner.media.as_mut().and_then(|m| m.events.as_mut()) {
                while let Ok(event) = events.try_recv() {
                    queued.push(event);
                }
            }
            (generation, queued)
        };

        let count = queued.len();
        for event in queued {
            if !self.apply_media_event(generation, event).await {
                break;
            }
        }
        count
    }

    fn spawn_event_pump(&self, generation: u64, mut events: mpsc::UnboundedReceiver<MediaEvent>) {
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                if !controller.apply_media_event(generation, event).await {
                    break;
                }
            }
        });
    }

    /// Returns false once the session is gone and further events are moot.
    async fn apply_media_event(&self, generation: u64, event: MediaEvent) -> bool {
        let released = {
            let mut inner = self.inner.lock();
            if inner.generation != generation || inner.media.is_none() {
                return false;
            }

            match event {
                MediaEvent::TimeUpdate { position_secs } => {
                    let position = clamp_position(position_secs, inner.duration());
                    inner.current_time_secs = position;
                    let change = inner.cursor.observe(position);
                    self.publish_verse(&inner, change);
                    self.publish_position(&inner);
                    return true;
                }
                MediaEvent::Ended => {
                    inner.current_time_secs = 0.0;
                    self.transition(&mut inner, PlayerState::Ended);
                    self.publish_position(&inner);
                    return true;
                }
                MediaEvent::Failed { message } => {
                    warn!(instance = %self.id, error = %message, "Media playback failed");
                    self.fail(&mut inner, EngineCondition::MediaPlaybackFailure)
                }
            }
        };

        self.release(released).await;
        false
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Tear down for unmount. Further commands return `Disposed`.
    pub async fn dispose(&self) {
        let session = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            self.reset(&mut inner)
        };

        self.coordinator.on_stop(self.id);
        self.release(session).await;
        debug!(instance = %self.id, "Player disposed");
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.coordinator.on_stop(self.id);

        let Some(session) = self.inner.get_mut().media.take().map(|m| m.session) else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let media = self.media.clone();
            handle.spawn(async move {
                media.unload(session).await.ok();
            });
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlaybackController")
            .field("id", &self.id)
            .field("version_id", &inner.version_id)
            .field("reference", &inner.reference.raw_text())
            .field("state", &inner.state)
            .finish()
    }
}
