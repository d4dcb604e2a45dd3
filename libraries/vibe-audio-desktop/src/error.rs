/// Audio output errors
use thiserror::Error;

/// Result type for output operations
pub type Result<T> = std::result::Result<T, OutputError>;

/// Output and media loading errors
#[derive(Debug, Error)]
pub enum OutputError {
    /// Device not found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to play stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Failed to pause stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// CPAL error
    #[error("CPAL error: {0}")]
    CpalError(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Track URI cannot be loaded by this element
    #[error("Unsupported media location: {0}")]
    UnsupportedLocation(String),

    /// Fetching remote media failed
    #[error("Failed to fetch media: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Remote media server answered with an error
    #[error("Media server error ({0})")]
    FetchStatus(u16),

    /// Reading local media failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding failed
    #[error(transparent)]
    Decode(#[from] vibe_audio::AudioError),

    /// The audio thread is gone
    #[error("Audio thread stopped")]
    ThreadStopped,
}

impl From<cpal::BuildStreamError> for OutputError {
    fn from(err: cpal::BuildStreamError) -> Self {
        OutputError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for OutputError {
    fn from(err: cpal::PlayStreamError) -> Self {
        OutputError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for OutputError {
    fn from(err: cpal::PauseStreamError) -> Self {
        OutputError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for OutputError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        OutputError::CpalError(err.to_string())
    }
}

impl From<OutputError> for vibe_playback::PlaybackError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::PlayError(_) | OutputError::ThreadStopped => {
                vibe_playback::PlaybackError::OutputUnavailable(err.to_string())
            }
            other => vibe_playback::PlaybackError::Load(other.to_string()),
        }
    }
}

impl From<OutputError> for vibe_core::VibeError {
    fn from(err: OutputError) -> Self {
        vibe_core::VibeError::audio(err.to_string())
    }
}
