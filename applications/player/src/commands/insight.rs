//! `vibe` and `presets` subcommands

use super::first_snapshot;
use crate::config::PlayerConfig;
use std::sync::Arc;
use tracing::warn;
use vibe_audio::{EqPreset, EQ_FREQUENCIES};
use vibe_core::VibeAnalysis;
use vibe_insight::{GeminiClient, VibeAnalyzer};
use vibe_library::LibraryStore;

/// Analyzer from configuration; offline when the client cannot be built
pub fn analyzer(config: &PlayerConfig) -> VibeAnalyzer {
    match GeminiClient::new(config.model_config()) {
        Ok(client) => VibeAnalyzer::new(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Text model unavailable");
            VibeAnalyzer::offline()
        }
    }
}

pub fn format_report(report: &VibeAnalysis) -> String {
    format!(
        "{}\n  vibe:     {}\n  mood:     {}\n  gradient: {} -> {}",
        report.playlist_name,
        report.vibe,
        report.description,
        report.suggested_color_from,
        report.suggested_color_to
    )
}

/// Analyze the library titles and print the report
pub async fn vibe(config: &PlayerConfig, store: &LibraryStore) -> anyhow::Result<()> {
    let titles: Vec<String> = first_snapshot(store)
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();

    let report = analyzer(config).analyze(&titles).await;
    println!("{}", format_report(&report));
    Ok(())
}

/// The preset table, one row per preset
pub fn preset_table() -> String {
    let mut out = format!("{:<10}", "Preset");
    for hz in EQ_FREQUENCIES {
        let label = if hz >= 1000.0 {
            format!("{}k", hz / 1000.0)
        } else {
            format!("{}", hz)
        };
        out.push_str(&format!("{:>7}", label));
    }
    out.push('\n');

    for preset in EqPreset::ALL {
        out.push_str(&format!("{:<10}", preset.name()));
        for gain in preset.gains() {
            out.push_str(&format!("{:>7}", gain));
        }
        out.push('\n');
    }
    out
}

pub fn presets() -> anyhow::Result<()> {
    print!("{}", preset_table());
    Ok(())
}
