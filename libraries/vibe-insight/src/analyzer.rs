//! Vibe analyzer
//!
//! Turns a list of track titles into a [`VibeAnalysis`]. Never fails: an
//! empty list short-circuits to the "Silence" report and any model error
//! yields the "Mixed" report.

use crate::error::{InsightError, Result};
use crate::model::{vibe_schema, TextModel};
use std::sync::Arc;
use tracing::{debug, error};
use vibe_core::VibeAnalysis;

/// Report for an empty library
pub fn silence() -> VibeAnalysis {
    VibeAnalysis {
        vibe: "Silence".into(),
        description: "Add some tracks to get the party started.".into(),
        suggested_color_from: "#1e293b".into(),
        suggested_color_to: "#0f172a".into(),
        playlist_name: "Empty Space".into(),
    }
}

/// Report used when the model cannot be reached or answers badly
pub fn mixed() -> VibeAnalysis {
    VibeAnalysis {
        vibe: "Mixed".into(),
        description: "An eclectic mix of personal favorites.".into(),
        suggested_color_from: "#6366f1".into(),
        suggested_color_to: "#a855f7".into(),
        playlist_name: "My Collection".into(),
    }
}

fn prompt(titles: &[String]) -> String {
    format!(
        "Analyze this list of songs and generate a 'Vibe Report'.\n\
         Songs: {}.\n\n\
         Return a creative playlist name, a short poetic description of the mood (max 2 sentences), \
         a short 'vibe' keyword (e.g., 'Melancholy', 'High Energy', 'Focus'), and two hex color codes \
         that represent this mood for a UI gradient.",
        titles.join(", ")
    )
}

/// Asks a [`TextModel`] for a vibe report
#[derive(Clone)]
pub struct VibeAnalyzer {
    model: Option<Arc<dyn TextModel>>,
}

impl VibeAnalyzer {
    /// Analyzer backed by `model`
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Analyzer without a model; every non-empty request yields the fallback
    pub fn offline() -> Self {
        Self { model: None }
    }

    /// Whether a model is configured
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Analyze `titles`
    pub async fn analyze(&self, titles: &[String]) -> VibeAnalysis {
        if titles.is_empty() {
            return silence();
        }

        match self.request(titles).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(error = %e, "Vibe analysis failed");
                mixed()
            }
        }
    }

    async fn request(&self, titles: &[String]) -> Result<VibeAnalysis> {
        let model = self.model.as_ref().ok_or(InsightError::MissingApiKey)?;
        debug!(count = titles.len(), "Analyzing playlist vibe");

        let text = model.generate_json(&prompt(titles), &vibe_schema()).await?;
        serde_json::from_str(&text).map_err(|e| InsightError::ParseError(e.to_string()))
    }
}

impl std::fmt::Debug for VibeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VibeAnalyzer")
            .field("has_model", &self.has_model())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_titles() {
        let p = prompt(&["Summer Walk".into(), "Lofi Chill".into()]);
        assert!(p.contains("Songs: Summer Walk, Lofi Chill."));
        assert!(p.contains("two hex color codes"));
    }

    #[test]
    fn fallbacks_are_distinct() {
        assert_eq!(silence().playlist_name, "Empty Space");
        assert_eq!(mixed().playlist_name, "My Collection");
        assert_ne!(silence(), mixed());
    }
}
