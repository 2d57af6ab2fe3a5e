use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
