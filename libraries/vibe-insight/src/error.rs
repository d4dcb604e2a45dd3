//! Error types for vibe analysis.

use thiserror::Error;

/// Errors raised while asking a text model for a vibe report.
///
/// [`crate::VibeAnalyzer`] never returns these; any of them selects the
/// fallback analysis.
#[derive(Error, Debug)]
pub enum InsightError {
    /// No API key configured
    #[error("No API key configured")]
    MissingApiKey,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Model endpoint returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Response carried no text
    #[error("No data returned")]
    EmptyResponse,

    /// Response text was not a valid vibe report
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;

impl From<InsightError> for vibe_core::VibeError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::Request(_) => vibe_core::VibeError::Network(err.to_string()),
            other => vibe_core::VibeError::analysis(other.to_string()),
        }
    }
}
