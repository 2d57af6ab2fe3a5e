//! # Event Bus System
//!
//! Provides an event-driven surface for the scripture audio engine using
//! `tokio::sync::broadcast`. Player instances publish typed events; hosts
//! subscribe to drive their UI (play/pause buttons, verse highlighting,
//! scrubbers) without polling controller snapshots.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐
//! │ Controller A ├────────────>│           │    subscribe    ┌────────────┐
//! └──────────────┘             │ EventBus  ├────────────────>│ Host UI    │
//! ┌──────────────┐    emit     │ (broadcast│                 └────────────┘
//! │ Controller B ├────────────>│  channel) │    subscribe    ┌────────────┐
//! └──────────────┘             │           ├────────────────>│ Telemetry  │
//!                              └───────────┘                 └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::PlayStateChanged {
//!         instance_id: "a1".to_string(),
//!         version_id: 111,
//!         is_playing: true,
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Play state changed");
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Playback Events
//! - `StateChanged`: Player state machine moved
//! - `PlayStateChanged`: Audible/not audible (the host's play-state callback)
//! - `VerseChanged`: Verse under the playhead changed (the verse callback)
//! - `PositionChanged`: Playback position updated
//! - `TimingUnavailable`: Verse timing could not be loaded; highlighting is off
//! - `Error`: Media failed to load or play
//!
//! ### Availability Events
//! - `Checked`: Availability probe resolved for a chapter
//! - `IncompleteReference`: Probe skipped because the reference has no chapter
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position updates arrive several times per second per playing instance;
/// subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Player instance events
    Playback(PlaybackEvent),
    /// Audio availability events
    Availability(AvailabilityEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Availability(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::TimingUnavailable { .. }) => EventSeverity::Warning,
            CoreEvent::Availability(AvailabilityEvent::IncompleteReference { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Playback(PlaybackEvent::PlayStateChanged { .. }) => EventSeverity::Info,
            CoreEvent::Availability(AvailabilityEvent::Checked { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Instance that produced the event.
    pub fn instance_id(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.instance_id(),
            CoreEvent::Availability(e) => e.instance_id(),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events published by a single player instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The player state machine moved to a new state.
    StateChanged {
        instance_id: String,
        version_id: u32,
        /// Lower-case state name, e.g. `"loading"`.
        state: String,
    },
    /// The instance became audible or stopped being audible.
    PlayStateChanged {
        instance_id: String,
        version_id: u32,
        is_playing: bool,
    },
    /// The verse under the playhead changed.
    VerseChanged {
        instance_id: String,
        version_id: u32,
        /// USFM verse id, `None` when the playhead left every timed range.
        verse_usfm: Option<String>,
        /// Display label such as `"John 3:17"`.
        label: Option<String>,
    },
    /// Playback position updated (time update or seek).
    PositionChanged {
        instance_id: String,
        position_secs: f64,
        duration_secs: f64,
    },
    /// Verse timing could not be loaded for the chapter.
    TimingUnavailable {
        instance_id: String,
        version_id: u32,
        chapter_ref: String,
    },
    /// Media failed to load or failed mid-playback.
    Error {
        instance_id: String,
        version_id: u32,
        message: String,
        /// Whether `play()` will retry from scratch.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { .. } => "Player state changed",
            PlaybackEvent::PlayStateChanged { .. } => "Play state changed",
            PlaybackEvent::VerseChanged { .. } => "Current verse changed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::TimingUnavailable { .. } => "Verse timing unavailable",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    fn instance_id(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { instance_id, .. }
            | PlaybackEvent::PlayStateChanged { instance_id, .. }
            | PlaybackEvent::VerseChanged { instance_id, .. }
            | PlaybackEvent::PositionChanged { instance_id, .. }
            | PlaybackEvent::TimingUnavailable { instance_id, .. }
            | PlaybackEvent::Error { instance_id, .. } => instance_id,
        }
    }
}

// ============================================================================
// Availability Events
// ============================================================================

/// Results of availability probes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AvailabilityEvent {
    /// A probe for the current inputs resolved.
    Checked {
        instance_id: String,
        version_id: u32,
        chapter_ref: String,
        available: bool,
    },
    /// The reference has no chapter, so no probe was issued.
    IncompleteReference {
        instance_id: String,
        version_id: u32,
        reference: String,
    },
}

impl AvailabilityEvent {
    fn description(&self) -> &str {
        match self {
            AvailabilityEvent::Checked { .. } => "Audio availability checked",
            AvailabilityEvent::IncompleteReference { .. } => "Reference is missing a chapter",
        }
    }

    fn instance_id(&self) -> &str {
        match self {
            AvailabilityEvent::Checked { instance_id, .. }
            | AvailabilityEvent::IncompleteReference { instance_id, .. } => instance_id,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let verses_only = EventStream::new(event_bus.subscribe()).filter(|event| {
///     matches!(event, CoreEvent::Playback(core_runtime::events::PlaybackEvent::VerseChanged { .. }))
/// });
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only pass events produced by one instance.
    pub fn for_instance(self, instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        self.filter(move |event| event.instance_id() == instance_id)
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
