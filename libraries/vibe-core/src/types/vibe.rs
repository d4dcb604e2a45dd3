/// Playlist vibe analysis result
use serde::{Deserialize, Serialize};

/// Gradient start used when no analysis is available
pub const DEFAULT_GRADIENT_FROM: &str = "#4f46e5";

/// Gradient end (and visualizer accent) used when no analysis is available
pub const DEFAULT_GRADIENT_TO: &str = "#ec4899";

/// Cosmetic summary of a playlist produced by a text model
///
/// Not authoritative data; only used for theming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeAnalysis {
    /// Creative playlist name
    pub playlist_name: String,
    /// Short mood keyword
    pub vibe: String,
    /// One or two sentence description
    pub description: String,
    /// Gradient start color (hex)
    pub suggested_color_from: String,
    /// Gradient end color (hex)
    pub suggested_color_to: String,
}

impl VibeAnalysis {
    /// Theme gradient for an optional analysis
    pub fn gradient(analysis: Option<&Self>) -> (String, String) {
        match analysis {
            Some(a) => (a.suggested_color_from.clone(), a.suggested_color_to.clone()),
            None => (DEFAULT_GRADIENT_FROM.to_string(), DEFAULT_GRADIENT_TO.to_string()),
        }
    }

    /// Accent color for the visualizer
    pub fn accent(analysis: Option<&Self>) -> String {
        Self::gradient(analysis).1
    }
}
