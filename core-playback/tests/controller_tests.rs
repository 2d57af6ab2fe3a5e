//! Player lifecycle tests
//!
//! This test suite verifies:
//! - Availability gating and concurrent locator/timing loading
//! - Initial seek target selection
//! - Transport controls (pause idempotence, seek clamping, volume)
//! - Media events (time updates, end of media, failures)
//! - Teardown on input changes and discarding of stale work
//! - Single-audible-player coordination

use async_trait::async_trait;
use bridge_traits::audio_info::{AudioInfo, AudioInfoSource, VerseTiming};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{MediaBackend, MediaEvent, MediaRequest, MediaSessionId, PreparedMedia};
use core_playback::{
    Availability, EngineCondition, PlaybackController, PlaybackCoordinator, PlaybackError,
    PlayerConfig, PlayerContext, PlayerOptions, PlayerState,
};
use core_runtime::events::{AvailabilityEvent, CoreEvent, EventBus, EventStream, PlaybackEvent};
use core_scripture::Reference;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

// ============================================================================
// Fake AudioInfoSource
// ============================================================================

struct FakeSource {
    locator: Option<String>,
    timing: Option<Vec<VerseTiming>>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn john_3() -> Self {
        Self {
            locator: Some("//cdn.example.com/111/JHN/3.mp3".to_string()),
            timing: Some(vec![
                VerseTiming::new("JHN.3.15", 2.0, 10.0),
                VerseTiming::new("JHN.3.16", 10.0, 15.0),
                VerseTiming::new("JHN.3.17", 15.0, 20.0),
            ]),
            calls: AtomicUsize::new(0),
        }
    }

    fn without_timing() -> Self {
        Self {
            timing: None,
            ..Self::john_3()
        }
    }

    fn without_audio() -> Self {
        Self {
            locator: None,
            ..Self::john_3()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioInfoSource for FakeSource {
    async fn audio_info(&self, _version_id: u32, _chapter_ref: &str) -> BridgeResult<AudioInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AudioInfo {
            timing: self.timing.clone(),
            media_locator: self.locator.clone(),
        })
    }
}

// ============================================================================
// Fake MediaBackend
// ============================================================================

struct FakeMedia {
    duration_secs: f64,
    fail_prepare: bool,
    prepare_gate: Option<Arc<Notify>>,
    log: Mutex<Vec<String>>,
    sessions: Mutex<Vec<(MediaSessionId, mpsc::UnboundedSender<MediaEvent>)>>,
}

impl FakeMedia {
    fn new() -> Self {
        Self {
            duration_secs: 120.0,
            fail_prepare: false,
            prepare_gate: None,
            log: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail_prepare: true,
            ..Self::new()
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            prepare_gate: Some(gate),
            ..Self::new()
        }
    }

    fn record(&self, entry: String) {
        self.log.lock().push(entry);
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Number of calls of one kind (`play`, `seek`, `unload`, ...).
    fn count(&self, kind: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|entry| entry.split_whitespace().next() == Some(kind))
            .count()
    }

    fn live_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Push an event on the most recently prepared live session.
    fn emit(&self, event: MediaEvent) {
        let sessions = self.sessions.lock();
        let (_, sender) = sessions.last().expect("no live session");
        sender.send(event).expect("session receiver dropped");
    }

    fn ensure_live(&self, session: MediaSessionId) -> BridgeResult<()> {
        if self.sessions.lock().iter().any(|(id, _)| *id == session) {
            Ok(())
        } else {
            Err(BridgeError::SessionNotFound(session.to_string()))
        }
    }
}

#[async_trait]
impl MediaBackend for FakeMedia {
    async fn prepare(&self, request: MediaRequest) -> BridgeResult<PreparedMedia> {
        self.record(format!(
            "prepare {} {} {}",
            request.locator, request.initial_volume, request.muted
        ));

        if let Some(gate) = &self.prepare_gate {
            gate.notified().await;
        }
        if self.fail_prepare {
            return Err(BridgeError::OperationFailed("404 Not Found".to_string()));
        }

        let (sender, events) = mpsc::unbounded_channel();
        let session = MediaSessionId::new();
        self.sessions.lock().push((session, sender));

        Ok(PreparedMedia {
            session,
            duration_secs: self.duration_secs,
            events,
        })
    }

    async fn play(&self, session: MediaSessionId) -> BridgeResult<()> {
        self.ensure_live(session)?;
        self.record("play".to_string());
        Ok(())
    }

    async fn pause(&self, session: MediaSessionId) -> BridgeResult<()> {
        self.ensure_live(session)?;
        self.record("pause".to_string());
        Ok(())
    }

    async fn seek(&self, session: MediaSessionId, position_secs: f64) -> BridgeResult<()> {
        self.ensure_live(session)?;
        self.record(format!("seek {}", position_secs));
        Ok(())
    }

    async fn set_volume(&self, session: MediaSessionId, volume: f32) -> BridgeResult<()> {
        self.ensure_live(session)?;
        self.record(format!("volume {}", volume));
        Ok(())
    }

    async fn set_muted(&self, session: MediaSessionId, muted: bool) -> BridgeResult<()> {
        self.ensure_live(session)?;
        self.record(format!("muted {}", muted));
        Ok(())
    }

    async fn unload(&self, session: MediaSessionId) -> BridgeResult<()> {
        self.record("unload".to_string());
        self.sessions.lock().retain(|(id, _)| *id != session);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    source: Arc<FakeSource>,
    media: Arc<FakeMedia>,
    coordinator: Arc<PlaybackCoordinator>,
    events: EventBus,
    config: PlayerConfig,
}

impl Harness {
    fn new(source: FakeSource, media: FakeMedia) -> Self {
        Self {
            source: Arc::new(source),
            media: Arc::new(media),
            coordinator: Arc::new(PlaybackCoordinator::new()),
            events: EventBus::new(256),
            config: PlayerConfig::manual_events(),
        }
    }

    fn john_3() -> Self {
        Self::new(FakeSource::john_3(), FakeMedia::new())
    }

    fn context(&self) -> PlayerContext {
        PlayerContext {
            audio_source: self.source.clone(),
            media_backend: self.media.clone(),
            coordinator: self.coordinator.clone(),
            events: self.events.clone(),
            config: self.config.clone(),
        }
    }

    fn player_with(&self, version_id: u32, reference: &str, options: PlayerOptions) -> Arc<PlaybackController> {
        PlaybackController::new(self.context(), version_id, Reference::parse(reference), options)
            .unwrap()
    }

    fn player(&self, version_id: u32, reference: &str) -> Arc<PlaybackController> {
        self.player_with(version_id, reference, PlayerOptions::default())
    }
}

fn drain(stream: &mut EventStream) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        events.push(event);
    }
    events
}

fn play_states(events: &[CoreEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|event| match event {
            CoreEvent::Playback(PlaybackEvent::PlayStateChanged { is_playing, .. }) => Some(*is_playing),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Availability and Loading
// ============================================================================

#[tokio::test]
async fn test_chapterless_reference_never_loads() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John");
    let mut stream = EventStream::new(harness.events.subscribe());

    player.play().await.unwrap();

    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert_eq!(harness.source.calls(), 0);
    assert!(harness.media.log().is_empty());

    let snapshot = player.snapshot();
    assert!(snapshot.incomplete_reference);
    assert_eq!(snapshot.conditions, vec![EngineCondition::IncompleteReference]);
    assert!(snapshot.diagnostic().unwrap().contains("Please include a chapter number"));

    let events = drain(&mut stream);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Availability(AvailabilityEvent::IncompleteReference { reference, .. }) if reference == "John"
    )));
    assert!(!events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::StateChanged { state, .. }) if state == "loading"
    )));
}

#[tokio::test]
async fn test_play_loads_and_starts_at_reference_verse() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    let mut stream = EventStream::new(harness.events.subscribe()).for_instance(player.id().to_string());

    player.play().await.unwrap();

    assert_eq!(player.state(), PlayerState::Playing);
    // Probe, then locator and timing.
    assert_eq!(harness.source.calls(), 3);
    assert_eq!(
        harness.media.log(),
        vec![
            "prepare https://cdn.example.com/111/JHN/3.mp3 0.7 false".to_string(),
            "seek 10".to_string(),
            "play".to_string(),
        ]
    );

    let snapshot = player.snapshot();
    assert!(snapshot.is_playing);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.current_time_secs, 10.0);
    assert_eq!(snapshot.duration_secs, 120.0);
    assert_eq!(snapshot.current_verse.as_deref(), Some("JHN.3.16"));
    assert_eq!(snapshot.current_verse_label.as_deref(), Some("John 3:16"));
    assert_eq!(snapshot.availability, Availability::Available);
    assert_eq!(harness.coordinator.current(), Some(player.id()));

    let states: Vec<String> = drain(&mut stream)
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Playback(PlaybackEvent::StateChanged { state, .. }) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec!["checking_availability", "available", "loading", "ready", "playing"]
    );
}

#[tokio::test]
async fn test_refresh_then_play_skips_second_probe() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");

    assert_eq!(player.refresh_availability().await.unwrap(), Availability::Available);
    assert_eq!(player.state(), PlayerState::Available);
    assert_eq!(harness.source.calls(), 1);

    player.play().await.unwrap();
    assert_eq!(harness.source.calls(), 3);
    assert_eq!(player.state(), PlayerState::Playing);
}

#[tokio::test]
async fn test_missing_verse_timing_starts_at_chapter_start() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:40");

    player.play().await.unwrap();

    assert!(harness.media.log().contains(&"seek 2".to_string()));
    assert_eq!(player.current_verse().as_deref(), Some("JHN.3.15"));
}

#[tokio::test]
async fn test_target_verse_overrides_reference_verse() {
    let harness = Harness::john_3();
    let player = harness.player_with(
        111,
        "John 3:16",
        PlayerOptions::default().with_target_verse("JHN.3.17"),
    );

    player.play().await.unwrap();
    assert!(harness.media.log().contains(&"seek 15".to_string()));

    player.set_target_verse(Some("JHN.3.15".to_string())).await.unwrap();
    assert_eq!(player.snapshot().current_time_secs, 2.0);
    assert_eq!(player.current_verse().as_deref(), Some("JHN.3.15"));
}

#[tokio::test]
async fn test_timing_unavailable_still_plays() {
    let harness = Harness::new(FakeSource::without_timing(), FakeMedia::new());
    let player = harness.player(111, "John 3:16");
    let mut stream = EventStream::new(harness.events.subscribe());

    player.play().await.unwrap();

    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(harness.media.count("seek"), 0);

    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 12.0 });
    player.pump_media_events().await;

    let snapshot = player.snapshot();
    assert!(snapshot.timing_unavailable);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.current_verse, None);
    assert_eq!(snapshot.current_time_secs, 12.0);
    assert!(snapshot.conditions.contains(&EngineCondition::TimingUnavailable));
    assert!(player.markers().is_empty());

    assert!(drain(&mut stream).iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::TimingUnavailable { chapter_ref, .. }) if chapter_ref == "JHN.3"
    )));
}

#[tokio::test]
async fn test_unavailable_version_stays_inert() {
    let harness = Harness::new(FakeSource::without_audio(), FakeMedia::new());
    let player = harness.player(206, "John 3:16");

    player.play().await.unwrap();
    assert_eq!(player.state(), PlayerState::Unavailable);
    assert_eq!(harness.source.calls(), 1);

    player.play().await.unwrap();
    assert_eq!(harness.source.calls(), 1);
    assert!(harness.media.log().is_empty());

    let snapshot = player.snapshot();
    assert_eq!(snapshot.availability, Availability::Unavailable);
    assert!(snapshot.conditions.contains(&EngineCondition::AudioUnavailable));
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_version_without_audio_makes_no_calls() {
    let harness = Harness::john_3();
    let player = harness.player_with(59, "John 3:16", PlayerOptions::default().with_has_audio(false));

    player.play().await.unwrap();
    assert_eq!(player.refresh_availability().await.unwrap(), Availability::Undetermined);

    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert_eq!(harness.source.calls(), 0);
}

#[tokio::test]
async fn test_direct_locator_replaces_resolution() {
    let harness = Harness::john_3();
    let player = harness.player_with(
        111,
        "John 3:16",
        PlayerOptions::default().with_direct_locator("//mirror.example.com/jhn3.mp3"),
    );

    player.play().await.unwrap();

    assert_eq!(player.state(), PlayerState::Playing);
    // Availability check and timing; the locator is never resolved.
    assert_eq!(harness.source.calls(), 2);
    assert_eq!(
        harness.media.log()[0],
        "prepare https://mirror.example.com/jhn3.mp3 0.7 false"
    );
    assert_eq!(player.current_verse().as_deref(), Some("JHN.3.16"));
}

#[tokio::test]
async fn test_direct_locator_still_checks_availability() {
    let harness = Harness::new(FakeSource::without_audio(), FakeMedia::new());
    let player = harness.player_with(
        111,
        "John 3:16",
        PlayerOptions::default().with_direct_locator("//mirror.example.com/jhn3.mp3"),
    );

    assert_eq!(player.refresh_availability().await.unwrap(), Availability::Unavailable);
    player.play().await.unwrap();

    assert_eq!(player.state(), PlayerState::Unavailable);
    assert_eq!(harness.source.calls(), 1);
    assert!(harness.media.log().is_empty());
}

#[tokio::test]
async fn test_prepare_failure_enters_error() {
    let harness = Harness::new(FakeSource::john_3(), FakeMedia::failing());
    let player = harness.player(111, "John 3:16");
    let mut stream = EventStream::new(harness.events.subscribe());

    let result = player.play().await;
    assert!(matches!(result, Err(PlaybackError::MediaLoad(_))));

    let snapshot = player.snapshot();
    assert_eq!(
        snapshot.state,
        PlayerState::Error {
            message: "Failed to load audio".to_string()
        }
    );
    assert_eq!(snapshot.error.as_deref(), Some("Failed to load audio"));
    assert!(snapshot.conditions.contains(&EngineCondition::MediaLoadFailure));
    assert!(!snapshot.is_loading);
    assert_eq!(harness.coordinator.current(), None);

    assert!(drain(&mut stream).iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Error { recoverable: true, .. })
    )));
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_pause_twice_equals_pause_once() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    let mut stream = EventStream::new(harness.events.subscribe());

    player.pause().await.unwrap();
    player.pause().await.unwrap();

    assert_eq!(player.state(), PlayerState::Paused);
    assert_eq!(harness.media.count("pause"), 1);
    assert_eq!(play_states(&drain(&mut stream)), vec![false]);
    assert_eq!(harness.coordinator.current(), None);

    player.play().await.unwrap();
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(harness.coordinator.current(), Some(player.id()));
}

#[tokio::test]
async fn test_pause_before_load_is_noop() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");

    player.pause().await.unwrap();
    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert!(harness.media.log().is_empty());
}

#[tokio::test]
async fn test_seek_clamps_and_updates_verse() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");

    assert!(matches!(player.seek(5.0).await, Err(PlaybackError::NoMediaLoaded)));

    player.play().await.unwrap();

    assert_eq!(player.seek(-5.0).await.unwrap(), 0.0);
    assert_eq!(player.current_verse(), None);

    assert_eq!(player.seek(1_000.0).await.unwrap(), 120.0);

    assert_eq!(player.seek(16.0).await.unwrap(), 16.0);
    assert_eq!(player.current_verse().as_deref(), Some("JHN.3.17"));
    assert_eq!(player.snapshot().current_time_secs, 16.0);
    assert!(harness.media.log().contains(&"seek 120".to_string()));
}

#[tokio::test]
async fn test_volume_and_mute() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");

    assert!(matches!(
        player.set_volume(1.5).await,
        Err(PlaybackError::InvalidVolume(v)) if v == 1.5
    ));
    assert!(matches!(
        player.set_volume(-0.1).await,
        Err(PlaybackError::InvalidVolume(_))
    ));

    // Applied to the next session without media loaded.
    player.set_volume(0.4).await.unwrap();
    player.set_muted(true).await.unwrap();
    player.play().await.unwrap();
    assert_eq!(
        harness.media.log()[0],
        "prepare https://cdn.example.com/111/JHN/3.mp3 0.4 true"
    );

    player.set_volume(0.9).await.unwrap();
    player.set_muted(false).await.unwrap();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.volume, 0.9);
    assert!(!snapshot.muted);
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(harness.media.count("volume"), 1);
    assert_eq!(harness.media.count("muted"), 1);
}

// ============================================================================
// Media Events
// ============================================================================

#[tokio::test]
async fn test_time_updates_move_the_verse() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    let mut stream = EventStream::new(harness.events.subscribe()).filter(|event| {
        matches!(event, CoreEvent::Playback(PlaybackEvent::VerseChanged { .. }))
    });

    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 11.0 });
    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 14.0 });
    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 15.5 });
    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 21.0 });
    assert_eq!(player.pump_media_events().await, 4);

    let labels: Vec<Option<String>> = drain(&mut stream)
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Playback(PlaybackEvent::VerseChanged { label, .. }) => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec![Some("John 3:17".to_string()), None]);
}

#[tokio::test]
async fn test_ended_resets_time_and_releases_coordinator() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    let mut stream = EventStream::new(harness.events.subscribe());

    harness.media.emit(MediaEvent::Ended);
    player.pump_media_events().await;

    assert_eq!(player.state(), PlayerState::Ended);
    assert_eq!(player.snapshot().current_time_secs, 0.0);
    assert_eq!(harness.coordinator.current(), None);
    assert_eq!(play_states(&drain(&mut stream)), vec![false]);

    // The highlight stays on the last verse until playback restarts.
    assert_eq!(player.current_verse().as_deref(), Some("JHN.3.16"));

    player.play().await.unwrap();
    assert_eq!(player.state(), PlayerState::Playing);
    let log = harness.media.log();
    assert_eq!(&log[log.len() - 2..], &["seek 0".to_string(), "play".to_string()]);
    assert_eq!(player.snapshot().current_time_secs, 0.0);
    assert_eq!(player.current_verse(), None);
}

#[tokio::test]
async fn test_seek_after_end_resumes_from_seek_position() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();

    harness.media.emit(MediaEvent::Ended);
    player.pump_media_events().await;
    assert_eq!(player.state(), PlayerState::Ended);

    assert_eq!(player.seek(16.0).await.unwrap(), 16.0);
    assert_eq!(player.state(), PlayerState::Paused);

    player.play().await.unwrap();
    assert_eq!(player.state(), PlayerState::Playing);

    let log = harness.media.log();
    assert_eq!(&log[log.len() - 2..], &["seek 16".to_string(), "play".to_string()]);
    assert_eq!(harness.media.count("seek"), 2);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.current_time_secs, 16.0);
    assert_eq!(snapshot.current_verse.as_deref(), Some("JHN.3.17"));
    assert_eq!(harness.coordinator.current(), Some(player.id()));
}

#[tokio::test]
async fn test_media_failure_then_retry_from_scratch() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();

    harness.media.emit(MediaEvent::Failed {
        message: "MEDIA_ERR_NETWORK".to_string(),
    });
    player.pump_media_events().await;

    let snapshot = player.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some("Failed to load audio"));
    assert!(snapshot.conditions.contains(&EngineCondition::MediaPlaybackFailure));
    assert_eq!(harness.media.count("unload"), 1);
    assert_eq!(harness.media.live_sessions(), 0);
    assert_eq!(harness.coordinator.current(), None);
    assert_eq!(player.current_verse(), None);

    player.play().await.unwrap();
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(harness.source.calls(), 6);
    assert!(player.snapshot().conditions.is_empty());
}

#[tokio::test]
async fn test_spawned_pump_delivers_events() {
    let mut harness = Harness::john_3();
    harness.config = PlayerConfig::default();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    let mut stream = EventStream::new(harness.events.subscribe()).for_instance(player.id().to_string());

    harness.media.emit(MediaEvent::TimeUpdate { position_secs: 16.0 });

    let verse = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if let CoreEvent::Playback(PlaybackEvent::VerseChanged { verse_usfm, .. }) =
                stream.recv().await.unwrap()
            {
                return verse_usfm;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(verse.as_deref(), Some("JHN.3.17"));
    assert_eq!(player.pump_media_events().await, 0);
}

// ============================================================================
// Input Changes
// ============================================================================

#[tokio::test]
async fn test_reference_change_mid_playback_tears_down() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    let calls_before = harness.source.calls();
    let mut stream = EventStream::new(harness.events.subscribe());

    player.set_reference(Reference::parse("Genesis 1:1")).await.unwrap();

    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert_eq!(player.current_verse(), None);
    assert!(player.markers().is_empty());
    assert_eq!(harness.media.count("unload"), 1);
    assert_eq!(harness.media.live_sessions(), 0);
    assert_eq!(harness.coordinator.current(), None);
    // Nothing probed yet for the new inputs.
    assert_eq!(harness.source.calls(), calls_before);

    let events = drain(&mut stream);
    assert_eq!(play_states(&events), vec![false]);
    assert!(!events.iter().any(|e| matches!(e, CoreEvent::Availability(_))));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.reference, "Genesis 1:1");
    assert_eq!(snapshot.current_time_secs, 0.0);
    assert_eq!(snapshot.duration_secs, 0.0);
    assert_eq!(snapshot.availability, Availability::Undetermined);

    assert_eq!(player.refresh_availability().await.unwrap(), Availability::Available);
}

#[tokio::test]
async fn test_unchanged_inputs_keep_playing() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();

    player.set_reference(Reference::parse(" John 3:16 ")).await.unwrap();
    player.set_version(111).await.unwrap();

    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(harness.media.count("unload"), 0);

    player.set_version(206).await.unwrap();
    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert_eq!(player.version_id(), 206);
}

#[tokio::test]
async fn test_stale_prepare_is_released() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::new(FakeSource::john_3(), FakeMedia::gated(gate.clone()));
    let player = harness.player(111, "John 3:16");

    let task = tokio::spawn({
        let player = player.clone();
        async move { player.play().await }
    });

    while harness.media.count("prepare") == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(player.state(), PlayerState::Loading);

    player.set_reference(Reference::parse("Genesis 1:1")).await.unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();

    assert_eq!(player.state(), PlayerState::Uninitialized);
    assert_eq!(harness.media.count("play"), 0);
    assert_eq!(harness.media.count("unload"), 1);
    assert_eq!(harness.media.live_sessions(), 0);
    assert_eq!(harness.coordinator.current(), None);
}

// ============================================================================
// Coordination and Lifecycle
// ============================================================================

#[tokio::test]
async fn test_only_one_version_is_audible() {
    let harness = Harness::john_3();
    let niv = harness.player(111, "John 3:16");
    let kjv = harness.player(206, "John 3:16");

    niv.play().await.unwrap();
    kjv.play().await.unwrap();

    assert!(niv.observe_coordinator().await.unwrap());
    assert!(!kjv.observe_coordinator().await.unwrap());

    assert_eq!(niv.state(), PlayerState::Paused);
    assert_eq!(kjv.state(), PlayerState::Playing);
    assert_eq!(harness.coordinator.current(), Some(kjv.id()));

    // Observing again does not pause twice.
    assert!(!niv.observe_coordinator().await.unwrap());
    assert_eq!(harness.media.count("pause"), 1);

    niv.play().await.unwrap();
    assert!(kjv.observe_coordinator().await.unwrap());
    assert_eq!(kjv.state(), PlayerState::Paused);
    assert_eq!(niv.state(), PlayerState::Playing);
    assert_eq!(harness.coordinator.current(), Some(niv.id()));
}

#[tokio::test]
async fn test_watchers_pause_the_previous_player() {
    let harness = Harness::john_3();
    let niv = harness.player(111, "John 3:16");
    let kjv = harness.player(206, "John 3:16");
    let watchers = [niv.watch_coordinator(), kjv.watch_coordinator()];

    niv.play().await.unwrap();
    kjv.play().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        while niv.state() != PlayerState::Paused {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("watcher never paused the first player");

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(kjv.state(), PlayerState::Playing);
    assert_eq!(harness.coordinator.current(), Some(kjv.id()));
    assert_eq!(harness.media.count("pause"), 1);

    for watcher in watchers {
        watcher.abort();
    }
}

#[tokio::test]
async fn test_should_pause_acts_on_rising_edge() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();

    player.set_should_pause(true).await.unwrap();
    assert_eq!(player.state(), PlayerState::Paused);

    player.set_should_pause(true).await.unwrap();
    assert_eq!(harness.media.count("pause"), 1);

    // Starting playback clears the flag, so the next request pauses again.
    player.play().await.unwrap();
    player.set_should_pause(true).await.unwrap();
    assert_eq!(player.state(), PlayerState::Paused);
    assert_eq!(harness.media.count("pause"), 2);
}

#[tokio::test]
async fn test_dispose_releases_everything() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();

    player.dispose().await;

    assert_eq!(harness.coordinator.current(), None);
    assert_eq!(harness.media.live_sessions(), 0);
    assert!(matches!(player.play().await, Err(PlaybackError::Disposed)));
    assert!(matches!(
        player.set_reference(Reference::parse("John 4")).await,
        Err(PlaybackError::Disposed)
    ));
}

#[tokio::test]
async fn test_drop_clears_coordinator() {
    let harness = Harness::john_3();
    let player = harness.player(111, "John 3:16");
    player.play().await.unwrap();
    assert_eq!(harness.coordinator.current(), Some(player.id()));

    drop(player);
    assert_eq!(harness.coordinator.current(), None);
}
