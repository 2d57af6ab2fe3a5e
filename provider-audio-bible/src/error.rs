//! Error types for the audio-bible provider

use thiserror::Error;

/// Audio metadata lookup errors
#[derive(Error, Debug)]
pub enum AudioApiError {
    /// The service answered with a non-2xx status
    #[error("Audio API error: {status}")]
    Api { status: u16 },

    /// The body was not the expected JSON
    #[error("Failed to parse audio API response: {0}")]
    Parse(String),

    /// The chapter reference cannot be sent to the service
    #[error("Invalid chapter reference: {0}")]
    InvalidReference(String),

    /// Transport failure from the HTTP bridge
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for audio-bible operations
pub type Result<T> = std::result::Result<T, AudioApiError>;

impl From<AudioApiError> for bridge_traits::error::BridgeError {
    fn from(error: AudioApiError) -> Self {
        match error {
            AudioApiError::Bridge(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}
