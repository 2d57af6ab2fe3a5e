//! Audio-bible API response types
//!
//! The chapter endpoint nests its payload under `response.data[]`, but older
//! deployments and some proxies return flat objects with the media URL at the
//! top level. Every field is optional so both shapes decode.

use bridge_traits::{normalize_media_locator, VerseTiming};
use serde::{Deserialize, Serialize};

/// Body of `chapter.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterAudioResponse {
    #[serde(default)]
    pub response: Option<ChapterEnvelope>,

    // Flat fallbacks
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub download_urls: Option<DownloadUrls>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub mp3_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterEnvelope {
    #[serde(default)]
    pub data: Vec<ChapterRecording>,
}

/// One recording of a chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterRecording {
    #[serde(default)]
    pub download_urls: Option<DownloadUrls>,
    #[serde(default)]
    pub timing: Option<Vec<TimingEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadUrls {
    #[serde(default)]
    pub format_mp3_32k: Option<String>,
}

/// Verse offset as the service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingEntry {
    pub usfm: String,
    pub start: f64,
    pub end: f64,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl ChapterAudioResponse {
    fn first_recording(&self) -> Option<&ChapterRecording> {
        self.response.as_ref().and_then(|r| r.data.first())
    }

    /// Playable URL, normalized to a fully-qualified URL.
    ///
    /// Looks at the nested 32k MP3 first, then each flat field in turn.
    pub fn media_locator(&self) -> Option<String> {
        let nested = self
            .first_recording()
            .and_then(|rec| rec.download_urls.as_ref())
            .and_then(|urls| non_blank(&urls.format_mp3_32k));

        let flat_download = self
            .download_urls
            .as_ref()
            .and_then(|urls| non_blank(&urls.format_mp3_32k));

        nested
            .or_else(|| non_blank(&self.audio_url))
            .or(flat_download)
            .or_else(|| non_blank(&self.url))
            .or_else(|| non_blank(&self.audio))
            .or_else(|| non_blank(&self.mp3_url))
            .map(normalize_media_locator)
    }

    /// Verse timing of the first recording, if the service sent any.
    pub fn timing(&self) -> Option<Vec<VerseTiming>> {
        self.first_recording()
            .and_then(|rec| rec.timing.as_ref())
            .map(|entries| {
                entries
                    .iter()
                    .map(|t| VerseTiming::new(t.usfm.clone(), t.start, t.end))
                    .collect()
            })
    }
}
