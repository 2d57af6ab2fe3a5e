//! # Audio Availability
//!
//! Decides whether a version has a recording for a chapter before any media
//! is loaded. Probes fail closed: any error means `Unavailable`.

use bridge_traits::audio_info::{normalize_media_locator, AudioInfoSource};
use core_scripture::Reference;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{PlaybackError, Result};

/// Outcome of the most recent probe for a player's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Not probed yet, or the reference is incomplete.
    #[default]
    Undetermined,
    Unavailable,
    Available,
}

/// Result of [`AvailabilityProbe::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Resolved(Availability),
    /// A newer probe started for different inputs; drop this result.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProbeKey {
    version_id: u32,
    chapter_ref: Option<String>,
}

/// Resolve the playable locator for a chapter.
pub async fn fetch_media_locator(
    source: &dyn AudioInfoSource,
    version_id: u32,
    chapter_ref: &str,
) -> Result<String> {
    let info = source.audio_info(version_id, chapter_ref).await?;

    info.media_locator
        .as_deref()
        .filter(|locator| !locator.trim().is_empty())
        .map(normalize_media_locator)
        .ok_or_else(|| {
            PlaybackError::MediaLoad(format!(
                "No audio for version {} at {}",
                version_id, chapter_ref
            ))
        })
}

/// Last-write-wins availability check.
pub struct AvailabilityProbe {
    source: Arc<dyn AudioInfoSource>,
    latest: Mutex<Option<ProbeKey>>,
}

impl AvailabilityProbe {
    pub fn new(source: Arc<dyn AudioInfoSource>) -> Self {
        Self {
            source,
            latest: Mutex::new(None),
        }
    }

    /// Probe `(version_id, reference)`.
    ///
    /// Incomplete references resolve to `Undetermined` without a request.
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub async fn check(&self, version_id: u32, reference: &Reference) -> ProbeOutcome {
        let key = ProbeKey {
            version_id,
            chapter_ref: reference.chapter_usfm(),
        };
        *self.latest.lock() = Some(key.clone());

        let Some(chapter_ref) = key.chapter_ref.as_deref() else {
            debug!("Reference has no chapter, skipping probe");
            return ProbeOutcome::Resolved(Availability::Undetermined);
        };

        let availability = match fetch_media_locator(&*self.source, version_id, chapter_ref).await {
            Ok(_) => Availability::Available,
            Err(e) => {
                warn!(version_id, chapter_ref, error = %e, "Audio availability check failed");
                Availability::Unavailable
            }
        };

        if self.latest.lock().as_ref() != Some(&key) {
            debug!(version_id, chapter_ref, "Probe superseded");
            return ProbeOutcome::Superseded;
        }

        ProbeOutcome::Resolved(availability)
    }
}

impl std::fmt::Debug for AvailabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityProbe")
            .field("latest", &*self.latest.lock())
            .finish()
    }
}
