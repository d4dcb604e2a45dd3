//! Error types for playback control

use thiserror::Error;

/// Playback errors
///
/// Raised by [`MediaElement`](crate::MediaElement) and
/// [`OutputContext`](crate::OutputContext) implementations. The controller
/// logs them and resets to a paused state; they never reach its callers.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The platform refused to start playback (e.g. autoplay policy)
    #[error("Play request rejected: {0}")]
    PlayRejected(String),

    /// The track could not be loaded or decoded
    #[error("Failed to load track: {0}")]
    Load(String),

    /// The output device could not be started
    #[error("Output unavailable: {0}")]
    OutputUnavailable(String),

    /// The output context has been shut down
    #[error("Output context is closed")]
    Closed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

impl From<PlaybackError> for vibe_core::VibeError {
    fn from(err: PlaybackError) -> Self {
        vibe_core::VibeError::playback(err.to_string())
    }
}
