//! Audio metadata collaborator.
//!
//! One round trip per `(version, chapter)` returns the verse timing table and
//! the playable media locator for that chapter's recording. Either part may be
//! absent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Offset of one verse inside a chapter recording, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseTiming {
    /// USFM verse identifier, e.g. `JHN.3.16`.
    pub usfm: String,
    pub start: f64,
    pub end: f64,
}

impl VerseTiming {
    pub fn new(usfm: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            usfm: usfm.into(),
            start,
            end,
        }
    }

    /// Half-open containment test: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Audio metadata for one chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub timing: Option<Vec<VerseTiming>>,
    /// Media URL, already normalized to a fully-qualified URL.
    pub media_locator: Option<String>,
}

impl AudioInfo {
    pub fn has_media(&self) -> bool {
        self.media_locator
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Source of per-chapter audio metadata.
///
/// `chapter_ref` is the USFM chapter reference (`JHN.3`). Implementations
/// report transport and decoding failures as `Err`; callers decide how to
/// degrade.
#[async_trait]
pub trait AudioInfoSource: Send + Sync {
    async fn audio_info(&self, version_id: u32, chapter_ref: &str) -> Result<AudioInfo>;
}

/// Rewrite a protocol-relative locator (`//host/path`) to `https://host/path`.
pub fn normalize_media_locator(locator: &str) -> String {
    let trimmed = locator.trim();
    match trimmed.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => trimmed.to_string(),
    }
}
