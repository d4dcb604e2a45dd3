//! `play` subcommand
//!
//! Composition root for interactive playback: one output device, one EQ
//! graph, the library subscription, and a terminal visualizer that only
//! runs while audio is playing.

use super::insight::analyzer;
use super::snapshot_channel;
use crate::canvas::TextCanvas;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use vibe_audio::{AudioEngine, MediaSource, PresetEngine, Rgba, SpectrumAnalyser, VisualizerLoop};
use vibe_audio_desktop::{CpalOutput, DesktopElement};
use vibe_core::VibeAnalysis;
use vibe_library::LibraryStore;
use vibe_playback::{PlaybackController, PlaybackEvent};

/// A line typed while playing
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Toggle the current track, or start the first one
    PlayPause,
    Next,
    Prev,
    /// Jump to a position in seconds
    Seek(f64),
    /// Apply an EQ preset by name
    Eq(String),
    Quit,
}

impl PlayerCommand {
    /// Parse one input line; blank lines give `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "pause" | "play" | "p" => Self::PlayPause,
            "next" | "n" => Self::Next,
            "prev" | "previous" => Self::Prev,
            "seek" => {
                let secs = parts
                    .next()
                    .ok_or_else(|| PlayerError::BadRequest("seek needs a position in seconds".into()))?
                    .parse::<f64>()
                    .map_err(|e| PlayerError::BadRequest(format!("invalid position: {}", e)))?;
                Self::Seek(secs)
            }
            "eq" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(PlayerError::BadRequest("eq needs a preset name".into()));
                }
                Self::Eq(name)
            }
            "quit" | "q" | "exit" => Self::Quit,
            other => {
                return Err(PlayerError::BadRequest(format!("unknown command: {}", other)));
            }
        };
        Ok(Some(command))
    }
}

fn accent_of(report: Option<&VibeAnalysis>) -> Rgba {
    Rgba::from_hex(&VibeAnalysis::accent(report)).unwrap_or(Rgba::rgb(0xec, 0x48, 0x99))
}

/// Keeps exactly one visualizer running while audio plays
struct Visuals {
    analyser: Option<Arc<SpectrumAnalyser>>,
    accent: Rgba,
    interval: Duration,
    width: usize,
    playing: watch::Sender<bool>,
    active: Option<VisualizerLoop>,
}

impl Visuals {
    fn sync(&mut self, playing: bool) {
        let changed = self.playing.send_if_modified(|current| {
            let changed = *current != playing;
            *current = playing;
            changed
        });
        if !changed {
            return;
        }

        if playing {
            if let Some(analyser) = &self.analyser {
                self.active = Some(VisualizerLoop::spawn(
                    Arc::clone(analyser),
                    TextCanvas::new(std::io::stdout(), self.width),
                    self.accent,
                    self.playing.subscribe(),
                    self.interval,
                ));
            }
        } else if let Some(retiring) = self.active.take() {
            // Let it draw the idle frame and exit on its own
            tokio::spawn(retiring.join());
        }
    }

    async fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown().await;
        }
    }
}

async fn apply(command: PlayerCommand, controller: &mut PlaybackController, presets: &mut PresetEngine) {
    match command {
        PlayerCommand::PlayPause => controller.play_pause().await,
        PlayerCommand::Next => controller.next().await,
        PlayerCommand::Prev => controller.prev().await,
        PlayerCommand::Seek(secs) => controller.seek(secs),
        PlayerCommand::Eq(name) => {
            let gains = presets.apply_preset(&name);
            println!("\rEQ {} {:?}", presets.selected(), gains);
        }
        PlayerCommand::Quit => {}
    }
}

/// Start the requested track, or the first one
async fn start(controller: &mut PlaybackController, requested: Option<&str>) {
    let chosen = requested.and_then(|id| {
        let found = controller.library().iter().find(|t| t.id.as_str() == id).cloned();
        if found.is_none() {
            warn!(id, "Requested track not in library; starting from the top");
        }
        found
    });

    match chosen {
        Some(track) => controller.play_or_toggle(&track).await,
        None => controller.play_pause().await,
    }
}

fn report_events(controller: &mut PlaybackController) {
    for event in controller.drain_events() {
        match event {
            PlaybackEvent::TrackChanged {
                track_id: Some(id), ..
            } => {
                if let Some(track) = controller.library().iter().find(|t| t.id.as_str() == id) {
                    println!("\rNow playing: {} by {}", track.title, track.artist);
                }
            }
            PlaybackEvent::TrackChanged { track_id: None, .. } => {
                println!("\rPlayback stopped: the current track left the library");
            }
            PlaybackEvent::Error { message } => eprintln!("\rPlayback error: {}", message),
            other => debug!(event = ?other, "Playback event"),
        }
    }
}

/// Play through the library until `quit` or Ctrl-C
pub async fn play(
    config: &PlayerConfig,
    store: &LibraryStore,
    track: Option<String>,
    preset: Option<String>,
) -> anyhow::Result<()> {
    let source = Arc::new(MediaSource::new());
    let (output, mut element_events) = CpalOutput::open(Arc::clone(&source))?;

    let mut engine = AudioEngine::with_analyser(
        Arc::clone(output.context()),
        source,
        config.analyser_config(),
    );
    let graph = engine.initialize();
    let analyser = graph.as_ref().map(|g| Arc::clone(g.analyser()));

    let mut presets = PresetEngine::new(graph);
    let preset_name = preset.unwrap_or_else(|| config.audio.initial_preset.clone());
    let gains = presets.apply_preset(&preset_name);
    info!(preset = %preset_name, ?gains, "Equalizer preset applied");

    let element = DesktopElement::new(&output)?;
    let output = Arc::new(output);
    let mut controller = PlaybackController::new(Box::new(element), output.clone());

    let (playing, _) = watch::channel(false);
    let mut visuals = Visuals {
        analyser,
        accent: accent_of(None),
        interval: Duration::from_millis(config.audio.visualizer_interval_ms),
        width: config.audio.visualizer_width,
        playing,
        active: None,
    };

    let wants_report = config.model_config().api_key.is_some();
    let (report_tx, mut report_rx) = oneshot::channel::<VibeAnalysis>();
    let mut report_tx = Some(report_tx).filter(|_| wants_report);
    let mut awaiting_report = false;

    let (subscription, mut snapshots) = snapshot_channel(store);
    let mut pending_start = Some(track);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("Commands: pause | next | prev | seek <secs> | eq <preset> | quit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match PlayerCommand::parse(&line) {
                    Ok(Some(PlayerCommand::Quit)) => break,
                    Ok(Some(command)) => apply(command, &mut controller, &mut presets).await,
                    Ok(None) => {}
                    Err(e) => eprintln!("\r{}", e),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
            Some(tracks) = snapshots.recv() => {
                if let Some(tx) = report_tx.take() {
                    let titles: Vec<String> = tracks.iter().map(|t| t.title.clone()).collect();
                    let analyzer = analyzer(config);
                    awaiting_report = true;
                    tokio::spawn(async move {
                        let _ = tx.send(analyzer.analyze(&titles).await);
                    });
                }

                controller.set_library(tracks);
                if !store.is_live() {
                    debug!("Library served from the local slot");
                }
                if let Some(requested) = pending_start.take() {
                    start(&mut controller, requested.as_deref()).await;
                }
            }
            Some(event) = element_events.recv() => controller.handle_event(event).await,
            report = &mut report_rx, if awaiting_report => {
                awaiting_report = false;
                if let Ok(report) = report {
                    println!("\rVibe: {} ({})", report.playlist_name, report.vibe);
                    visuals.accent = accent_of(Some(&report));
                }
            }
        }

        report_events(&mut controller);
        visuals.sync(controller.is_playing());
    }

    visuals.shutdown().await;
    subscription.dispose();
    controller.pause();
    output.suspend();
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_commands() {
        assert_eq!(PlayerCommand::parse("next").unwrap(), Some(PlayerCommand::Next));
        assert_eq!(PlayerCommand::parse("  PREV ").unwrap(), Some(PlayerCommand::Prev));
        assert_eq!(PlayerCommand::parse("pause").unwrap(), Some(PlayerCommand::PlayPause));
        assert_eq!(PlayerCommand::parse("quit").unwrap(), Some(PlayerCommand::Quit));
        assert_eq!(PlayerCommand::parse("").unwrap(), None);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            PlayerCommand::parse("seek 42.5").unwrap(),
            Some(PlayerCommand::Seek(42.5))
        );
        assert_eq!(
            PlayerCommand::parse("eq Bass").unwrap(),
            Some(PlayerCommand::Eq("Bass".into()))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(PlayerCommand::parse("seek").is_err());
        assert!(PlayerCommand::parse("seek soon").is_err());
        assert!(PlayerCommand::parse("eq").is_err());
        assert!(PlayerCommand::parse("dance").is_err());
    }

    #[test]
    fn accent_defaults_to_pink() {
        assert_eq!(accent_of(None), Rgba::rgb(0xec, 0x48, 0x99));
        let report = vibe_insight::mixed();
        assert_eq!(accent_of(Some(&report)), Rgba::rgb(0xa8, 0x55, 0xf7));
        let garbled = VibeAnalysis {
            suggested_color_to: "#é0".into(),
            ..vibe_insight::mixed()
        };
        assert_eq!(accent_of(Some(&garbled)), Rgba::rgb(0xec, 0x48, 0x99));
    }
}
