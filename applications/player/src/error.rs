/// Player error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for PlayerError {
    fn from(err: config::ConfigError) -> Self {
        PlayerError::Config(err.to_string())
    }
}

impl From<PlayerError> for vibe_core::VibeError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::Unauthorized(msg) => vibe_core::VibeError::permission_denied(msg),
            PlayerError::BadRequest(msg) => vibe_core::VibeError::InvalidInput(msg),
            PlayerError::Io(e) => vibe_core::VibeError::Io(e),
            PlayerError::Config(msg) => vibe_core::VibeError::Other(msg),
        }
    }
}
