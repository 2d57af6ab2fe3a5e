//! Audio-bible chapter connector
//!
//! Implements `AudioInfoSource` for the audio-bible `chapter.json` service,
//! either directly or through a same-origin proxy that forwards the body
//! unchanged.

use async_trait::async_trait;
use bridge_traits::audio_info::{AudioInfo, AudioInfoSource};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::{ApiStyle, AudioApiConfig};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{AudioApiError, Result};
use crate::types::ChapterAudioResponse;

/// Audio-bible API connector
///
/// One `GET` per `(version, chapter)`; the response yields both the media
/// locator and the verse timing table.
///
/// # Example
///
/// ```ignore
/// use provider_audio_bible::AudioBibleConnector;
///
/// let connector = AudioBibleConnector::new(http_client, config.audio_api.clone());
/// let info = connector.chapter_audio(111, "JHN.3").await?;
/// ```
pub struct AudioBibleConnector {
    http_client: Arc<dyn HttpClient>,
    config: AudioApiConfig,
}

impl AudioBibleConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: AudioApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Request URL for one chapter.
    pub fn chapter_url(&self, version_id: u32, chapter_ref: &str) -> String {
        let base = self.config.base_url.trim().trim_end_matches('/');
        let reference = urlencoding::encode(chapter_ref);
        match self.config.style {
            ApiStyle::Proxy => format!("{}/{}/{}", base, version_id, reference),
            ApiStyle::Direct => format!(
                "{}/chapter.json?version_id={}&reference={}",
                base, version_id, reference
            ),
        }
    }

    fn build_request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .accept_json()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.timeout)
    }

    /// Fetch and decode the chapter body.
    #[instrument(skip(self), fields(style = ?self.config.style))]
    pub async fn fetch_chapter(
        &self,
        version_id: u32,
        chapter_ref: &str,
    ) -> Result<ChapterAudioResponse> {
        if chapter_ref.trim().is_empty() {
            return Err(AudioApiError::InvalidReference(chapter_ref.to_string()));
        }

        let url = self.chapter_url(version_id, chapter_ref);
        let response = self.http_client.execute(self.build_request(url)).await?;

        Self::decode(response)
    }

    fn decode(response: HttpResponse) -> Result<ChapterAudioResponse> {
        if !response.is_success() {
            warn!(status = response.status, "Audio API request failed");
            return Err(AudioApiError::Api {
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| AudioApiError::Parse(e.to_string()))
    }

    /// Media locator and timing for one chapter.
    pub async fn chapter_audio(&self, version_id: u32, chapter_ref: &str) -> Result<AudioInfo> {
        let body = self.fetch_chapter(version_id, chapter_ref).await?;

        let info = AudioInfo {
            timing: body.timing(),
            media_locator: body.media_locator(),
        };

        debug!(
            version_id,
            chapter_ref,
            has_media = info.has_media(),
            timing_entries = info.timing.as_ref().map_or(0, Vec::len),
            "Resolved chapter audio"
        );

        Ok(info)
    }
}

#[async_trait]
impl AudioInfoSource for AudioBibleConnector {
    async fn audio_info(
        &self,
        version_id: u32,
        chapter_ref: &str,
    ) -> bridge_traits::error::Result<AudioInfo> {
        Ok(self.chapter_audio(version_id, chapter_ref).await?)
    }
}
