/// CPAL-based audio output
///
/// A dedicated audio thread owns the CPAL stream; the rest of the player
/// talks to it through a command channel. The render callback plays the
/// loaded track buffer through the media source (and so through the EQ
/// graph when one is wired) and advances the context clock.
use crate::error::{OutputError, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use vibe_audio::{AudioContext, ContextState, MediaSource};
use vibe_playback::{ElementEvent, OutputContext, OutputState};

/// Interval between position notifications
const TIME_UPDATE_SECS: f64 = 0.25;

/// Commands sent to the audio thread
enum AudioCommand {
    /// Start the stream and mark the context running
    Resume(oneshot::Sender<Result<()>>),
    /// Pause the stream and mark the context suspended
    Suspend,
    /// Drop the stream and close the context
    Shutdown,
}

/// The loaded track, shared between the element and the render callback
pub(crate) struct PlayerState {
    /// Interleaved stereo at the output rate
    buffer: Mutex<Arc<Vec<f32>>>,
    /// Playback position in frames
    position: AtomicUsize,
    /// Whether the element is playing
    playing: AtomicBool,
}

impl PlayerState {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Mutex::new(Arc::new(Vec::new())),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
        }
    }

    pub(crate) fn buffer(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn set_buffer(&self, samples: Arc<Vec<f32>>) {
        *self.buffer.lock().unwrap_or_else(PoisonError::into_inner) = samples;
    }

    pub(crate) fn frames(&self) -> usize {
        self.buffer().len() / 2
    }

    pub(crate) fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    pub(crate) fn set_position(&self, frame: usize) {
        self.position.store(frame, Ordering::Release);
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }
}

/// Everything the render callback needs
pub(crate) struct Renderer {
    pub(crate) state: Arc<PlayerState>,
    pub(crate) source: Arc<MediaSource>,
    pub(crate) context: Arc<AudioContext>,
    pub(crate) events: mpsc::UnboundedSender<ElementEvent>,
    pub(crate) channels: usize,
    scratch: Vec<f32>,
    last_update: usize,
}

impl Renderer {
    pub(crate) fn new(
        state: Arc<PlayerState>,
        source: Arc<MediaSource>,
        context: Arc<AudioContext>,
        events: mpsc::UnboundedSender<ElementEvent>,
        channels: usize,
    ) -> Self {
        Self {
            state,
            source,
            context,
            events,
            channels: channels.max(1),
            scratch: Vec::new(),
            last_update: 0,
        }
    }

    /// Fill one device buffer
    pub(crate) fn render(&mut self, output: &mut [f32]) {
        if self.context.state() != ContextState::Running {
            output.fill(0.0);
            return;
        }

        let frames = output.len() / self.channels;
        self.scratch.clear();
        self.scratch.resize(frames * 2, 0.0);

        if self.state.is_playing() {
            self.fill_from_track();
        }

        let sample_rate = self.context.sample_rate();
        self.source.process(&mut self.scratch, sample_rate);
        self.context.advance(frames);

        for (out, stereo) in output
            .chunks_exact_mut(self.channels)
            .zip(self.scratch.chunks_exact(2))
        {
            match out.len() {
                1 => out[0] = (stereo[0] + stereo[1]) * 0.5,
                _ => {
                    out[0] = stereo[0];
                    out[1] = stereo[1];
                    out[2..].fill(0.0);
                }
            }
        }
    }

    fn fill_from_track(&mut self) {
        let buffer = self.state.buffer();
        let total = buffer.len() / 2;
        let start = self.state.position().min(total);
        let take = (self.scratch.len() / 2).min(total - start);

        self.scratch[..take * 2].copy_from_slice(&buffer[start * 2..(start + take) * 2]);
        let position = start + take;
        self.state.set_position(position);

        let rate = f64::from(self.context.sample_rate());
        if position >= total {
            self.state.set_playing(false);
            self.last_update = 0;
            let _ = self.events.send(ElementEvent::Ended);
        } else if position.abs_diff(self.last_update) as f64 >= TIME_UPDATE_SECS * rate {
            self.last_update = position;
            let _ = self.events.send(ElementEvent::TimeUpdate(position as f64 / rate));
        }
    }
}

/// CPAL audio output
///
/// Starts suspended, like a freshly created browser audio context; the
/// first `resume` starts the device stream.
pub struct CpalOutput {
    command_tx: Sender<AudioCommand>,
    context: Arc<AudioContext>,
    state: Arc<PlayerState>,
    events: mpsc::UnboundedSender<ElementEvent>,
    channels: u16,
    _audio_thread: Option<JoinHandle<()>>,
}

impl CpalOutput {
    /// Open the default output device
    ///
    /// Returns the output and the receiver for media element events.
    ///
    /// # Errors
    /// Returns an error if no audio device is found or the stream cannot be built
    pub fn open(source: Arc<MediaSource>) -> Result<(Self, mpsc::UnboundedReceiver<ElementEvent>)> {
        let state = Arc::new(PlayerState::new());
        let (command_tx, command_rx) = bounded::<AudioCommand>(32);
        let (ready_tx, ready_rx) = bounded::<Result<(Arc<AudioContext>, u16)>>(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let state_clone = Arc::clone(&state);
        let events = event_tx.clone();
        let audio_thread = thread::Builder::new()
            .name("vibe-audio-output".to_string())
            .spawn(move || {
                Self::audio_thread_run(state_clone, source, event_tx, &command_rx, &ready_tx);
            })?;

        let (context, channels) = ready_rx.recv().map_err(|_| OutputError::ThreadStopped)??;
        info!(
            sample_rate = context.sample_rate(),
            channels, "Audio output opened"
        );

        Ok((
            Self {
                command_tx,
                context,
                state,
                events,
                channels,
                _audio_thread: Some(audio_thread),
            },
            event_rx,
        ))
    }

    /// The render clock for this output
    pub fn context(&self) -> &Arc<AudioContext> {
        &self.context
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate()
    }

    /// Device channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Pause the device stream
    pub fn suspend(&self) {
        let _ = self.command_tx.send(AudioCommand::Suspend);
    }

    pub(crate) fn player_state(&self) -> Arc<PlayerState> {
        Arc::clone(&self.state)
    }

    pub(crate) fn event_sender(&self) -> mpsc::UnboundedSender<ElementEvent> {
        self.events.clone()
    }

    fn open_device() -> Result<(Device, StreamConfig)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::DeviceNotFound)?;
        let config = device.default_output_config()?.config();
        Ok((device, config))
    }

    /// Audio thread main loop
    ///
    /// Owns the CPAL stream for its whole life.
    fn audio_thread_run(
        state: Arc<PlayerState>,
        source: Arc<MediaSource>,
        events: mpsc::UnboundedSender<ElementEvent>,
        command_rx: &Receiver<AudioCommand>,
        ready_tx: &Sender<Result<(Arc<AudioContext>, u16)>>,
    ) {
        let opened = Self::open_device().and_then(|(device, config)| {
            let context = Arc::new(AudioContext::new(config.sample_rate));
            let mut renderer = Renderer::new(
                state,
                source,
                Arc::clone(&context),
                events,
                config.channels as usize,
            );
            let stream = device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
                |err| error!(error = %err, "Audio stream error"),
                None,
            )?;
            Ok((stream, context, config.channels))
        });

        let (stream, context): (Stream, Arc<AudioContext>) = match opened {
            Ok((stream, context, channels)) => {
                let _ = ready_tx.send(Ok((Arc::clone(&context), channels)));
                (stream, context)
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        while let Ok(command) = command_rx.recv() {
            match command {
                AudioCommand::Resume(reply) => {
                    let result = stream
                        .play()
                        .map_err(OutputError::from)
                        .and_then(|()| {
                            context
                                .set_state(ContextState::Running)
                                .map_err(|e| OutputError::PlayError(e.to_string()))
                        });
                    if result.is_ok() {
                        debug!("Output resumed");
                    }
                    let _ = reply.send(result);
                }
                AudioCommand::Suspend => {
                    if let Err(e) = stream.pause() {
                        warn!(error = %e, "Failed to pause output stream");
                    }
                    let _ = context.set_state(ContextState::Suspended);
                }
                AudioCommand::Shutdown => break,
            }
        }

        let _ = context.set_state(ContextState::Closed);
        drop(stream);
        debug!("Audio thread exiting");
    }
}

#[async_trait]
impl OutputContext for CpalOutput {
    fn state(&self) -> OutputState {
        match self.context.state() {
            ContextState::Suspended => OutputState::Suspended,
            ContextState::Running => OutputState::Running,
            ContextState::Closed => OutputState::Closed,
        }
    }

    async fn resume(&self) -> vibe_playback::Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(AudioCommand::Resume(reply_tx))
            .map_err(|_| OutputError::ThreadStopped)?;
        reply_rx.await.map_err(|_| OutputError::ThreadStopped)??;
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(channels: usize) -> (Renderer, mpsc::UnboundedReceiver<ElementEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let context = Arc::new(AudioContext::new(8000));
        context.set_state(ContextState::Running).unwrap();
        let r = Renderer::new(
            Arc::new(PlayerState::new()),
            Arc::new(MediaSource::new()),
            context,
            tx,
            channels,
        );
        (r, rx)
    }

    #[test]
    fn suspended_context_renders_silence_without_advancing() {
        let (mut r, _rx) = renderer(2);
        r.context.set_state(ContextState::Suspended).unwrap();
        r.state.set_buffer(Arc::new(vec![0.5; 64]));
        r.state.set_playing(true);

        let mut out = vec![1.0; 16];
        r.render(&mut out);

        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(r.context.current_time(), 0.0);
        assert_eq!(r.state.position(), 0);
    }

    #[test]
    fn plays_buffer_and_reports_end() {
        let (mut r, mut rx) = renderer(2);
        r.state.set_buffer(Arc::new(vec![0.25; 20]));
        r.state.set_playing(true);

        let mut out = vec![0.0; 32];
        r.render(&mut out);

        assert!(out[..20].iter().all(|&s| s == 0.25));
        assert!(out[20..].iter().all(|&s| s == 0.0));
        assert!(!r.state.is_playing());
        assert_eq!(rx.try_recv().unwrap(), ElementEvent::Ended);
        assert_eq!(r.context.current_time(), 16.0 / 8000.0);
    }

    #[test]
    fn emits_time_updates() {
        let (mut r, mut rx) = renderer(2);
        r.state.set_buffer(Arc::new(vec![0.1; 8000 * 2]));
        r.state.set_playing(true);

        let mut out = vec![0.0; 2100 * 2];
        r.render(&mut out);

        assert_eq!(rx.try_recv().unwrap(), ElementEvent::TimeUpdate(2100.0 / 8000.0));
    }

    #[test]
    fn maps_stereo_to_device_channels() {
        let (mut mono, _rx) = renderer(1);
        mono.state.set_buffer(Arc::new(vec![1.0, 0.0, 1.0, 0.0]));
        mono.state.set_playing(true);
        let mut out = vec![0.0; 2];
        mono.render(&mut out);
        assert_eq!(out, vec![0.5, 0.5]);

        let (mut quad, _rx) = renderer(4);
        quad.state.set_buffer(Arc::new(vec![0.2, 0.4, 0.2, 0.4]));
        quad.state.set_playing(true);
        let mut out = vec![9.0; 8];
        quad.render(&mut out);
        assert_eq!(out, vec![0.2, 0.4, 0.0, 0.0, 0.2, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn paused_element_keeps_position() {
        let (mut r, _rx) = renderer(2);
        r.state.set_buffer(Arc::new(vec![0.3; 100]));
        r.state.set_position(10);

        let mut out = vec![1.0; 8];
        r.render(&mut out);

        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(r.state.position(), 10);
    }
}
