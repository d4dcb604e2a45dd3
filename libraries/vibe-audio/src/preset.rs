//! Equalizer presets
//!
//! Presets map a name onto five band gains. Applying one schedules a smooth
//! approach of every band gain toward its target, anchored at the context's
//! current time; a new preset issued mid-transition simply retargets.

use crate::graph::{FilterGraph, BAND_COUNT};
use crate::param::DEFAULT_TIME_CONSTANT;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Named equalizer preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqPreset {
    /// All bands flat
    #[default]
    Normal,
    /// Scooped mids, lifted extremes
    Rock,
    /// Forward mids
    Pop,
    /// Warm lows, airy highs
    Classical,
    /// Gentle smile curve
    Jazz,
    /// Heavy low end
    Bass,
}

impl EqPreset {
    /// Every preset, in display order
    pub const ALL: [EqPreset; 6] = [
        Self::Normal,
        Self::Rock,
        Self::Pop,
        Self::Classical,
        Self::Jazz,
        Self::Bass,
    ];

    /// Gains in dB, band order 60 Hz, 250 Hz, 1 kHz, 4 kHz, 16 kHz
    pub fn gains(self) -> [f32; BAND_COUNT] {
        match self {
            Self::Normal => [0.0, 0.0, 0.0, 0.0, 0.0],
            Self::Rock => [4.0, 2.0, -2.0, 3.0, 5.0],
            Self::Pop => [-1.0, 2.0, 4.0, 1.0, -1.0],
            Self::Classical => [4.0, 2.0, -1.0, 3.0, 4.0],
            Self::Jazz => [3.0, 2.0, -1.0, 2.0, 3.0],
            Self::Bass => [8.0, 5.0, 1.0, 0.0, 0.0],
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Rock => "Rock",
            Self::Pop => "Pop",
            Self::Classical => "Classical",
            Self::Jazz => "Jazz",
            Self::Bass => "Bass",
        }
    }

    /// Look a preset up by its exact display name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Gains for `name`; unknown names are flat
    pub fn gains_for(name: &str) -> [f32; BAND_COUNT] {
        Self::from_name(name).unwrap_or_default().gains()
    }
}

impl fmt::Display for EqPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies presets to a filter graph and remembers the selection
#[derive(Debug)]
pub struct PresetEngine {
    graph: Option<Arc<FilterGraph>>,
    selected: String,
    time_constant: f64,
}

impl PresetEngine {
    /// Engine driving `graph`; `None` until the graph has been built
    pub fn new(graph: Option<Arc<FilterGraph>>) -> Self {
        Self {
            graph,
            selected: EqPreset::Normal.name().to_string(),
            time_constant: DEFAULT_TIME_CONSTANT,
        }
    }

    /// Attach a graph built after the engine was created
    pub fn attach(&mut self, graph: Arc<FilterGraph>) {
        self.graph = Some(graph);
    }

    /// Name passed to the last `apply_preset`
    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Apply the preset called `name` and return its target gains
    ///
    /// The name is remembered even when it is not a known preset, in which
    /// case the flat gains are applied. Without a five-band graph nothing is
    /// scheduled.
    pub fn apply_preset(&mut self, name: &str) -> [f32; BAND_COUNT] {
        let gains = EqPreset::gains_for(name);
        self.selected = name.to_string();

        let Some(graph) = self.graph.as_ref() else {
            debug!(preset = name, "No filter graph; preset recorded only");
            return gains;
        };
        if graph.bands().len() != BAND_COUNT {
            debug!(
                preset = name,
                bands = graph.bands().len(),
                "Unexpected band count; preset recorded only"
            );
            return gains;
        }

        let now = graph.context().current_time();
        for (band, gain) in graph.bands().iter().zip(gains) {
            band.gain().set_target_at_time(gain, now, self.time_constant);
        }
        debug!(preset = name, ?gains, at = now, "Preset scheduled");

        gains
    }
}
