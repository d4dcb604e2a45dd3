//! Desktop media element
//!
//! Loads tracks lazily: `load` only selects and rewinds, the first `play`
//! fetches and decodes. Position and end-of-track notifications come from
//! the render callback.

use crate::error::OutputError;
use crate::loader::TrackLoader;
use crate::output::{CpalOutput, PlayerState};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use vibe_core::{Track, TrackId};
use vibe_playback::{ElementEvent, MediaElement, PlaybackError, Result};

/// Media element playing through a [`CpalOutput`]
pub struct DesktopElement {
    state: Arc<PlayerState>,
    loader: TrackLoader,
    events: mpsc::UnboundedSender<ElementEvent>,
    selected: Option<Track>,
    loaded: Option<TrackId>,
    duration: Option<f64>,
}

impl DesktopElement {
    /// Element rendering through `output`
    ///
    /// Metadata notifications share the output's event channel with the
    /// render callback.
    pub fn new(output: &CpalOutput) -> std::result::Result<Self, OutputError> {
        Ok(Self::with_state(
            output.player_state(),
            TrackLoader::new(output.sample_rate())?,
            output.event_sender(),
        ))
    }

    pub(crate) fn with_state(
        state: Arc<PlayerState>,
        loader: TrackLoader,
        events: mpsc::UnboundedSender<ElementEvent>,
    ) -> Self {
        Self {
            state,
            loader,
            events,
            selected: None,
            loaded: None,
            duration: None,
        }
    }

    fn rate(&self) -> f64 {
        f64::from(self.loader.target_rate())
    }

    async fn ensure_loaded(&mut self) -> Result<()> {
        let Some(track) = &self.selected else {
            return Err(PlaybackError::Load("no track selected".into()));
        };
        if self.loaded.as_ref() == Some(&track.id) {
            return Ok(());
        }

        let buffer = self.loader.load(track).await?;
        let seconds = buffer.duration_secs();
        let id = track.id.clone();

        // Keep a seek issued before the first play
        let frames = buffer.frames();
        self.state.set_buffer(Arc::new(buffer.samples));
        self.state.set_position(self.state.position().min(frames));
        self.loaded = Some(id);
        self.duration = Some(seconds);
        let _ = self.events.send(ElementEvent::LoadedMetadata(seconds));
        Ok(())
    }
}

#[async_trait]
impl MediaElement for DesktopElement {
    fn load(&mut self, track: &Track) -> Result<()> {
        crate::loader::MediaLocation::of(track).map_err(PlaybackError::from)?;

        self.state.set_playing(false);
        self.state.set_buffer(Arc::new(Vec::new()));
        self.state.set_position(0);
        self.selected = Some(track.clone());
        self.loaded = None;
        self.duration = None;
        debug!(id = %track.id, "Element source set");
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.ensure_loaded().await?;
        if self.state.position() >= self.state.frames() {
            self.state.set_position(0);
        }
        self.state.set_playing(true);
        Ok(())
    }

    fn pause(&mut self) {
        self.state.set_playing(false);
    }

    fn unload(&mut self) {
        self.state.set_playing(false);
        self.state.set_buffer(Arc::new(Vec::new()));
        self.state.set_position(0);
        self.selected = None;
        self.loaded = None;
        self.duration = None;
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut frame = (seconds.max(0.0) * self.rate()) as usize;
        if self.loaded.is_some() {
            frame = frame.min(self.state.frames());
        }
        self.state.set_position(frame);
    }

    fn current_time(&self) -> f64 {
        self.state.position() as f64 / self.rate()
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

impl std::fmt::Debug for DesktopElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopElement")
            .field("selected", &self.selected.as_ref().map(|t| &t.id))
            .field("loaded", &self.loaded)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// 16-bit PCM stereo WAV
    fn wav_bytes(rate: u32, frames: usize) -> Vec<u8> {
        let data_len = (frames * 4) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.write_all(b"RIFF").unwrap();
        out.write_all(&(36 + data_len).to_le_bytes()).unwrap();
        out.write_all(b"WAVEfmt ").unwrap();
        out.write_all(&16u32.to_le_bytes()).unwrap();
        out.write_all(&1u16.to_le_bytes()).unwrap();
        out.write_all(&2u16.to_le_bytes()).unwrap();
        out.write_all(&rate.to_le_bytes()).unwrap();
        out.write_all(&(rate * 4).to_le_bytes()).unwrap();
        out.write_all(&4u16.to_le_bytes()).unwrap();
        out.write_all(&16u16.to_le_bytes()).unwrap();
        out.write_all(b"data").unwrap();
        out.write_all(&data_len.to_le_bytes()).unwrap();
        for i in 0..frames {
            let s = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            out.write_all(&s.to_le_bytes()).unwrap();
            out.write_all(&s.to_le_bytes()).unwrap();
        }
        out
    }

    fn element(rate: u32) -> (DesktopElement, mpsc::UnboundedReceiver<ElementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let el = DesktopElement::with_state(
            Arc::new(PlayerState::new()),
            TrackLoader::new(rate).unwrap(),
            tx,
        );
        (el, rx)
    }

    fn upload(frames: usize) -> Track {
        Track::new("tone", "Local Artist", "file:///nowhere/tone.wav")
            .with_data(wav_bytes(8000, frames))
    }

    #[tokio::test]
    async fn play_decodes_in_memory_upload() {
        let (mut el, mut rx) = element(8000);
        el.load(&upload(4000)).unwrap();
        assert!(el.duration().is_none());

        el.play().await.unwrap();

        assert_eq!(el.duration(), Some(0.5));
        assert_eq!(rx.try_recv().unwrap(), ElementEvent::LoadedMetadata(0.5));
        assert!(el.state.is_playing());
        assert_eq!(el.state.frames(), 4000);
    }

    #[tokio::test]
    async fn seek_before_first_play_is_kept() {
        let (mut el, _rx) = element(8000);
        el.load(&upload(8000)).unwrap();
        el.set_current_time(0.25);
        el.play().await.unwrap();
        assert_eq!(el.current_time(), 0.25);

        el.set_current_time(5.0);
        assert_eq!(el.current_time(), 1.0);
    }

    #[tokio::test]
    async fn undecodable_bytes_reject_play() {
        let (mut el, _rx) = element(8000);
        let junk = Track::new("junk", "Local Artist", "file:///x/junk.mp3").with_data(vec![0; 64]);
        el.load(&junk).unwrap();
        assert!(matches!(el.play().await, Err(PlaybackError::Load(_))));
        assert!(!el.state.is_playing());
    }

    #[test]
    fn unsupported_uri_fails_load() {
        let (mut el, _rx) = element(8000);
        let track = Track::new("x", "y", "blob:https://app/123");
        assert!(el.load(&track).is_err());
    }

    #[tokio::test]
    async fn replay_after_end_restarts() {
        let (mut el, _rx) = element(8000);
        el.load(&upload(800)).unwrap();
        el.play().await.unwrap();
        el.state.set_position(800);
        el.state.set_playing(false);

        el.play().await.unwrap();
        assert_eq!(el.current_time(), 0.0);
    }
}
