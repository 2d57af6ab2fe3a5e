//! Current-verse tracking.
//!
//! Turns a stream of playback positions into verse-change notifications
//! against whichever [`TimingIndex`] is installed.

use std::sync::Arc;

use crate::timing::TimingIndex;

/// A change of the verse under the playhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

/// Tracks the verse under the playhead and reports only changes.
#[derive(Debug, Default)]
pub struct VerseCursor {
    index: Option<Arc<TimingIndex>>,
    current: Option<String>,
}

impl VerseCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn index(&self) -> Option<&Arc<TimingIndex>> {
        self.index.as_ref()
    }

    /// Feed a playback position.
    pub fn observe(&mut self, t: f64) -> Option<VerseChange> {
        let next = self
            .index
            .as_ref()
            .and_then(|index| index.verse_at(t))
            .map(str::to_string);
        self.update(next)
    }

    /// Swap in a new index and re-derive the verse at `now` against it.
    pub fn install(&mut self, index: Option<Arc<TimingIndex>>, now: f64) -> Option<VerseChange> {
        self.index = index;
        self.observe(now)
    }

    /// Drop the index and forget the current verse.
    pub fn clear(&mut self) -> Option<VerseChange> {
        self.index = None;
        self.update(None)
    }

    fn update(&mut self, next: Option<String>) -> Option<VerseChange> {
        if next == self.current {
            return None;
        }

        let previous = std::mem::replace(&mut self.current, next);
        Some(VerseChange {
            previous,
            current: self.current.clone(),
        })
    }
}
