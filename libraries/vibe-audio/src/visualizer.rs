//! Spectrum visualizer
//!
//! Turns analyser bytes into bar geometry and drives a [`Canvas`] from a
//! cancellable tokio task. The task samples only while the playing flag is
//! set; when playback stops it draws the idle baseline and exits.

use crate::analyser::SpectrumAnalyser;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Share of the spectrum drawn, starting from the lowest bin
pub const VISIBLE_FRACTION: f32 = 0.6;

/// Bars overlap slightly for a continuous look
const BAR_WIDTH_FACTOR: f32 = 1.5;

/// Tallest bar relative to canvas height, before the high-band boost
const HEIGHT_SCALE: f32 = 0.8;

/// Height of the idle baseline in pixels
const BASELINE_HEIGHT: f32 = 2.0;

/// An sRGB colour with alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha in [0, 1]
    pub a: f32,
}

impl Rgba {
    /// Faint white used for bar bottoms and the idle baseline
    pub const FAINT_WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 0.05,
    };

    /// Opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
                Some(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Axis-aligned rectangle, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// Vertical gradient for a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    /// Colour at the top of the bar
    pub top: Rgba,
    /// Colour at the canvas bottom
    pub bottom: Rgba,
}

impl Gradient {
    /// Accent fading to faint white
    pub fn accent(accent: Rgba) -> Self {
        Self {
            top: accent,
            bottom: Rgba::FAINT_WHITE,
        }
    }
}

/// Drawing surface for the visualizer
pub trait Canvas: Send {
    /// Width and height in pixels
    fn size(&self) -> (f32, f32);

    /// Clear the whole surface
    fn clear(&mut self);

    /// Fill a bar with a vertical gradient
    fn fill_gradient(&mut self, rect: Rect, gradient: Gradient);

    /// Fill a rectangle with a solid colour
    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Flush a finished frame
    fn present(&mut self) {}
}

/// Bar geometry for one frame
///
/// Uses the lowest 60% of `bins`; bar `i` of `n` is
/// `value / 255 * height * 0.8 * (1 + i / n)` tall.
pub fn layout_bars(bins: &[u8], width: f32, height: f32) -> Vec<Rect> {
    let visible = (bins.len() as f32 * VISIBLE_FRACTION).floor() as usize;
    if visible == 0 {
        return Vec::new();
    }

    let bar_width = width / visible as f32 * BAR_WIDTH_FACTOR;
    let mut x = 0.0;
    bins[..visible]
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let boost = 1.0 + i as f32 / visible as f32;
            let bar_height = f32::from(*value) / 255.0 * height * HEIGHT_SCALE * boost;
            let rect = Rect {
                x,
                y: height - bar_height,
                // One pixel gap between bars
                width: (bar_width - 1.0).max(0.0),
                height: bar_height,
            };
            x += bar_width;
            rect
        })
        .collect()
}

/// Draw one spectrum frame
pub fn render_spectrum<C: Canvas + ?Sized>(canvas: &mut C, bins: &[u8], accent: Rgba) {
    let (width, height) = canvas.size();
    canvas.clear();
    let gradient = Gradient::accent(accent);
    for bar in layout_bars(bins, width, height) {
        canvas.fill_gradient(bar, gradient);
    }
    canvas.present();
}

/// Draw the idle frame: cleared, with a thin baseline
pub fn render_idle<C: Canvas + ?Sized>(canvas: &mut C) {
    let (width, height) = canvas.size();
    canvas.clear();
    canvas.fill_rect(
        Rect {
            x: 0.0,
            y: height - BASELINE_HEIGHT,
            width,
            height: BASELINE_HEIGHT,
        },
        Rgba::FAINT_WHITE,
    );
    canvas.present();
}

/// Handle to a running visualizer task
///
/// Stopping (or dropping) the handle cancels the task before its next
/// tick. The task also ends on its own once the playing flag clears.
#[derive(Debug)]
pub struct VisualizerLoop {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl VisualizerLoop {
    /// Start sampling `analyser` into `canvas` every `interval`
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<C>(
        analyser: Arc<SpectrumAnalyser>,
        mut canvas: C,
        accent: Rgba,
        mut playing: watch::Receiver<bool>,
        interval: Duration,
    ) -> Self
    where
        C: Canvas + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut bins = vec![0u8; analyser.frequency_bin_count()];
            let mut frames: u64 = 0;

            loop {
                if !*playing.borrow_and_update() {
                    render_idle(&mut canvas);
                    break;
                }

                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    changed = playing.changed() => {
                        if changed.is_err() {
                            render_idle(&mut canvas);
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        analyser.get_byte_frequency_data(&mut bins);
                        render_spectrum(&mut canvas, &bins, accent);
                        frames += 1;
                        trace!(frames, "Visualizer frame");
                    }
                }
            }

            debug!(frames, "Visualizer stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the loop
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Wait for the task to end on its own
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for VisualizerLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
