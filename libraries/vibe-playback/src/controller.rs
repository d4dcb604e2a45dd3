//! Playback controller
//!
//! Holds the single "now playing" pointer over the current library
//! snapshot and turns transport requests into media element calls.

use crate::element::{MediaElement, OutputContext};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::types::{ElementEvent, OutputState, PlaybackState};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vibe_core::{Track, TrackId};

/// Transport for one media element
///
/// Every method absorbs failures: errors are logged, queued as
/// [`PlaybackEvent::Error`] and leave the controller paused.
pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    output: Arc<dyn OutputContext>,
    library: Vec<Track>,
    current: Option<Track>,
    state: PlaybackState,
    elapsed: f64,
    duration: f64,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Controller driving `element` through `output`
    pub fn new(element: Box<dyn MediaElement>, output: Arc<dyn OutputContext>) -> Self {
        Self {
            element,
            output,
            library: Vec::new(),
            current: None,
            state: PlaybackState::Stopped,
            elapsed: 0.0,
            duration: 0.0,
            pending_events: Vec::new(),
        }
    }

    // ===== Library =====

    /// Replace the library snapshot
    ///
    /// If the current track is no longer present, playback stops and the
    /// pointer is cleared.
    pub fn set_library(&mut self, tracks: Vec<Track>) {
        self.library = tracks;

        let Some(current) = &self.current else {
            return;
        };
        if let Some(updated) = self.library.iter().find(|t| t.id == current.id) {
            self.current = Some(updated.clone());
            return;
        }

        info!(id = %current.id, "Current track left the library; stopping");
        let previous = current.id.to_string();
        self.element.pause();
        self.element.unload();
        self.current = None;
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: None,
            previous_track_id: Some(previous),
        });
        self.set_state(PlaybackState::Stopped);
    }

    /// The library the controller navigates
    pub fn library(&self) -> &[Track] {
        &self.library
    }

    // ===== State =====

    /// The current track
    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Transport state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether audio is playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Elapsed seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Duration in seconds (0 until metadata is loaded)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    // ===== Transport =====

    /// Toggle `track` if it is current, otherwise switch to it and play from 0
    pub async fn play_or_toggle(&mut self, track: &Track) {
        if self.is_current(&track.id) {
            if self.is_playing() {
                self.pause();
            } else {
                self.start().await;
            }
            return;
        }
        self.switch_to(track.clone()).await;
    }

    /// Toggle the current track, or start the first one
    pub async fn play_pause(&mut self) {
        if let Some(current) = self.current.clone() {
            self.play_or_toggle(&current).await;
        } else if let Some(first) = self.library.first().cloned() {
            self.switch_to(first).await;
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.element.pause();
        self.set_state(PlaybackState::Paused);
    }

    /// Advance to the next track, wrapping at the end
    ///
    /// A current track missing from the library continues at the first
    /// track. Without a current track this does nothing.
    pub async fn next(&mut self) {
        if let Some(target) = self.neighbour(1) {
            self.switch_to(target).await;
        }
    }

    /// Go back to the previous track, wrapping at the start
    ///
    /// A current track missing from the library continues at the last
    /// track. Without a current track this does nothing.
    pub async fn prev(&mut self) {
        if let Some(target) = self.neighbour(-1) {
            self.switch_to(target).await;
        }
    }

    /// Jump to `seconds` in the current track
    ///
    /// The position is clamped to the known duration.
    pub fn seek(&mut self, seconds: f64) {
        if self.current.is_none() || !seconds.is_finite() {
            return;
        }
        let mut target = seconds.max(0.0);
        if self.duration > 0.0 {
            target = target.min(self.duration);
        }
        self.element.set_current_time(target);
        self.elapsed = target;
        self.emit_position();
    }

    /// React to a media element notification
    pub async fn handle_event(&mut self, event: ElementEvent) {
        match event {
            ElementEvent::TimeUpdate(seconds) => {
                self.elapsed = seconds;
                self.emit_position();
            }
            ElementEvent::LoadedMetadata(seconds) => {
                self.duration = seconds;
                self.emit_position();
            }
            ElementEvent::Ended => {
                if let Some(current) = &self.current {
                    self.pending_events.push(PlaybackEvent::TrackFinished {
                        track_id: current.id.to_string(),
                    });
                }
                self.next().await;
            }
        }
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn is_current(&self, id: &TrackId) -> bool {
        self.current.as_ref().is_some_and(|t| &t.id == id)
    }

    fn neighbour(&self, step: isize) -> Option<Track> {
        let current = self.current.as_ref()?;
        let len = self.library.len();
        if len == 0 {
            return None;
        }

        let index = match self.library.iter().position(|t| t.id == current.id) {
            Some(i) => (i as isize + step).rem_euclid(len as isize) as usize,
            None if step > 0 => 0,
            None => len - 1,
        };
        self.library.get(index).cloned()
    }

    async fn switch_to(&mut self, track: Track) {
        let previous = self.current.as_ref().map(|t| t.id.to_string());
        debug!(id = %track.id, title = %track.title, "Switching track");

        self.elapsed = 0.0;
        self.duration = 0.0;
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: Some(track.id.to_string()),
            previous_track_id: previous,
        });

        let load = self.element.load(&track);
        self.current = Some(track);

        match load {
            Ok(()) => self.start().await,
            Err(e) => self.fail(&e),
        }
    }

    /// Resume the output if needed, then play
    async fn start(&mut self) {
        match self.try_start().await {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(e) => self.fail(&e),
        }
    }

    async fn try_start(&mut self) -> Result<()> {
        match self.output.state() {
            OutputState::Suspended => {
                debug!("Resuming suspended output before play");
                self.output.resume().await?;
            }
            OutputState::Closed => return Err(PlaybackError::Closed),
            OutputState::Running => {}
        }
        self.element.play().await
    }

    fn fail(&mut self, error: &PlaybackError) {
        warn!(error = %error, "Playback failed");
        self.pending_events.push(PlaybackEvent::Error {
            message: error.to_string(),
        });
        self.set_state(if self.current.is_some() {
            PlaybackState::Paused
        } else {
            PlaybackState::Stopped
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.pending_events.push(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit_position(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            elapsed: self.elapsed,
            duration: self.duration,
        });
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("current", &self.current.as_ref().map(|t| &t.id))
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("duration", &self.duration)
            .field("library_len", &self.library.len())
            .finish_non_exhaustive()
    }
}
