//! Terminal canvas
//!
//! Draws the visualizer as one line of block characters, redrawn in place
//! with a carriage return. Bars are coloured with the accent as a 24-bit
//! ANSI foreground.

use std::io::Write;
use vibe_audio::{Canvas, Gradient, Rect, Rgba};

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Virtual pixels per terminal column
const PIXELS_PER_COLUMN: f32 = 4.0;

/// Virtual canvas height in pixels
const HEIGHT: f32 = 64.0;

pub struct TextCanvas<W: Write + Send> {
    out: W,
    columns: usize,
    /// Tallest bar per column, in pixels
    heights: Vec<f32>,
    color: Option<Rgba>,
    baseline: bool,
}

impl<W: Write + Send> TextCanvas<W> {
    pub fn new(out: W, columns: usize) -> Self {
        let columns = columns.max(1);
        Self {
            out,
            columns,
            heights: vec![0.0; columns],
            color: None,
            baseline: false,
        }
    }

    /// The frame as plain characters, without colour codes
    pub fn line(&self) -> String {
        if self.baseline {
            return "_".repeat(self.columns);
        }
        self.heights
            .iter()
            .map(|h| {
                let level = (h / HEIGHT * 8.0).round().clamp(0.0, 8.0) as usize;
                LEVELS[level]
            })
            .collect()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn columns_of(&self, rect: Rect) -> std::ops::Range<usize> {
        let start = (rect.x / PIXELS_PER_COLUMN).floor().max(0.0) as usize;
        let end = ((rect.x + rect.width) / PIXELS_PER_COLUMN).ceil().max(0.0) as usize;
        start.min(self.columns)..end.min(self.columns)
    }
}

impl<W: Write + Send> Canvas for TextCanvas<W> {
    fn size(&self) -> (f32, f32) {
        (self.columns as f32 * PIXELS_PER_COLUMN, HEIGHT)
    }

    fn clear(&mut self) {
        self.heights.fill(0.0);
        self.baseline = false;
    }

    fn fill_gradient(&mut self, rect: Rect, gradient: Gradient) {
        self.color = Some(gradient.top);
        for column in self.columns_of(rect) {
            self.heights[column] = self.heights[column].max(rect.height);
        }
    }

    fn fill_rect(&mut self, _rect: Rect, _color: Rgba) {
        self.baseline = true;
    }

    fn present(&mut self) {
        let line = self.line();
        let result = match self.color.filter(|_| !self.baseline) {
            Some(c) => write!(self.out, "\r\x1b[38;2;{};{};{}m{}\x1b[0m", c.r, c.g, c.b, line),
            None => write!(self.out, "\r{}", line),
        };
        // A lost frame is harmless
        let _ = result.and_then(|()| self.out.flush());
    }
}
