//! # Verse Timing Index
//!
//! Immutable per-chapter table of verse offsets. Entries may arrive
//! unsorted; lookups are linear scans over a few dozen verses at most.

use bridge_traits::audio_info::{AudioInfoSource, VerseTiming};
use core_scripture::Reference;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Reasons a chapter's timing could not be loaded.
#[derive(Error, Debug)]
pub enum TimingError {
    /// The reference has no chapter to look up.
    #[error("Reference has no chapter: {0}")]
    IncompleteReference(String),

    /// The audio metadata request failed.
    #[error("Timing request failed: {0}")]
    Fetch(#[from] bridge_traits::error::BridgeError),

    /// The service returned no timing for the chapter.
    #[error("No verse timing for {0}")]
    Missing(String),

    /// An entry had a non-finite or inverted range.
    #[error("Malformed timing for {usfm}: {reason}")]
    Malformed { usfm: String, reason: String },
}

/// Start and end of one verse, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerseBounds {
    pub start: f64,
    pub end: f64,
}

/// Marker for drawing a verse tick on a scrubber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseMarker {
    pub usfm: String,
    pub start: f64,
    /// `start / duration`, clamped to `0.0..=1.0`.
    pub position: f64,
}

/// Verse offsets for one chapter recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingIndex {
    entries: Vec<VerseTiming>,
}

impl TimingIndex {
    /// Build an index, rejecting entries with non-finite or empty ranges.
    pub fn new(entries: Vec<VerseTiming>) -> Result<Self, TimingError> {
        for entry in &entries {
            if !entry.start.is_finite() || !entry.end.is_finite() {
                return Err(TimingError::Malformed {
                    usfm: entry.usfm.clone(),
                    reason: "non-finite offset".to_string(),
                });
            }
            if entry.end <= entry.start {
                return Err(TimingError::Malformed {
                    usfm: entry.usfm.clone(),
                    reason: format!("end {} does not follow start {}", entry.end, entry.start),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Fetch the timing for `reference`'s chapter.
    #[instrument(skip(source, reference), fields(reference = %reference))]
    pub async fn load(
        source: &dyn AudioInfoSource,
        version_id: u32,
        reference: &Reference,
    ) -> Result<Self, TimingError> {
        let chapter_ref = reference
            .chapter_usfm()
            .ok_or_else(|| TimingError::IncompleteReference(reference.raw_text().to_string()))?;

        let info = source.audio_info(version_id, &chapter_ref).await?;
        let entries = info
            .timing
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TimingError::Missing(chapter_ref.clone()))?;

        debug!(chapter_ref = %chapter_ref, entries = entries.len(), "Loaded verse timing");
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VerseTiming] {
        &self.entries
    }

    /// Verse whose `[start, end)` contains `t`, first match wins.
    pub fn verse_at(&self, t: f64) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.contains(t))
            .map(|entry| entry.usfm.as_str())
    }

    pub fn bounds_of(&self, usfm: &str) -> Option<VerseBounds> {
        self.entries
            .iter()
            .find(|entry| entry.usfm == usfm)
            .map(|entry| VerseBounds {
                start: entry.start,
                end: entry.end,
            })
    }

    /// Earliest verse start, or 0.0 for an empty index.
    pub fn chapter_start(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.start)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Scrubber markers in table order. Empty when `duration` is not positive.
    pub fn markers(&self, duration: f64) -> Vec<VerseMarker> {
        if duration.is_nan() || duration <= 0.0 {
            return Vec::new();
        }

        self.entries
            .iter()
            .map(|entry| VerseMarker {
                usfm: entry.usfm.clone(),
                start: entry.start,
                position: (entry.start / duration).clamp(0.0, 1.0),
            })
            .collect()
    }
}
