//! Error types for the library store and its backends.

use thiserror::Error;

/// Errors raised by library backends.
///
/// The store itself never surfaces these to its callers; they drive the
/// remote-to-local fallback and are logged.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote store returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Remote store is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Invalid remote URL
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a remote response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Local slot I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local slot holds invalid JSON
    #[error("Corrupt library slot: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Change watcher could not be installed
    #[error("Watch error: {0}")]
    Watch(String),

    /// A snapshot feed ended unexpectedly
    #[error("Snapshot feed closed")]
    FeedClosed,
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;

impl LibraryError {
    /// Map a transport error, separating unreachable servers from other failures
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ServerUnreachable(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

impl From<LibraryError> for vibe_core::VibeError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Request(_) | LibraryError::ServerUnreachable(_) => {
                vibe_core::VibeError::Network(err.to_string())
            }
            other => vibe_core::VibeError::storage(other.to_string()),
        }
    }
}
