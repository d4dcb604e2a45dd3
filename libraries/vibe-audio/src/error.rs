/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// The media source already feeds a filter graph
    #[error("Media source is already connected to a graph")]
    SourceAlreadyConnected,

    /// A band filter could not be configured
    #[error("Filter error: {0}")]
    Filter(String),

    /// Analyser settings are out of range
    #[error("Invalid analyser configuration: {0}")]
    InvalidAnalyser(String),

    /// The audio context can no longer be used
    #[error("Audio context is closed")]
    ContextClosed,

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl From<AudioError> for vibe_core::VibeError {
    fn from(err: AudioError) -> Self {
        vibe_core::VibeError::audio(err.to_string())
    }
}
