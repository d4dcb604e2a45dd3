/// Core error types for Vibe Player
use thiserror::Error;
use crate::types::TrackId;

/// Result type alias using `VibeError`
pub type Result<T> = std::result::Result<T, VibeError>;

/// Core error type for Vibe Player
#[derive(Error, Debug)]
pub enum VibeError {
    /// Library storage errors (remote or local)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio graph, decoding or output errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Playback transport errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Text model / analysis errors
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Permission denied with context
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl VibeError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_format_messages() {
        assert_eq!(VibeError::storage("slot missing").to_string(), "Storage error: slot missing");
        assert_eq!(
            VibeError::permission_denied("admin only").to_string(),
            "Permission denied: admin only"
        );
        assert_eq!(
            VibeError::TrackNotFound(TrackId::new("cloud-9")).to_string(),
            "Track not found: cloud-9"
        );
    }
}
