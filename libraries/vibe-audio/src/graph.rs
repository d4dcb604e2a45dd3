//! Equalizer filter graph
//!
//! `source -> 60 Hz low shelf -> 250 Hz -> 1 kHz -> 4 kHz peaking -> 16 kHz
//! high shelf -> analyser -> destination`
//!
//! Building a graph splits it in two: the [`FilterGraph`] control handle
//! (band gains, analyser) stays with the caller, while the
//! [`GraphProcessor`] is installed on the media source and runs on the
//! audio thread.

use crate::analyser::{AnalyserConfig, AnalyserTap, SpectrumAnalyser};
use crate::context::{AudioContext, MediaSource};
use crate::effects::{BandFilter, BandSpec, EffectChain, FilterShape};
use crate::error::{AudioError, Result};
use crate::param::AudioParam;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of equalizer bands
pub const BAND_COUNT: usize = 5;

/// Band frequencies in Hz, lowest first
pub const EQ_FREQUENCIES: [f32; BAND_COUNT] = [60.0, 250.0, 1000.0, 4000.0, 16000.0];

/// Control handle for one band
#[derive(Debug, Clone)]
pub struct EqBand {
    spec: BandSpec,
    gain: Arc<AudioParam>,
}

impl EqBand {
    /// Centre/corner frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.spec.frequency
    }

    /// Filter shape
    pub fn shape(&self) -> FilterShape {
        self.spec.shape
    }

    /// Gain parameter in dB
    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }
}

/// Processing half of a graph, owned by the media source
pub struct GraphProcessor {
    chain: EffectChain,
}

impl GraphProcessor {
    /// Run one block through the bands and the analyser tap
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.chain.process(buffer, sample_rate);
    }

    /// Clear filter memory
    pub fn reset(&mut self) {
        self.chain.reset();
    }

    /// Stage names in processing order
    pub fn stages(&self) -> Vec<&str> {
        self.chain.names()
    }
}

/// Control half of a built graph
#[derive(Debug)]
pub struct FilterGraph {
    context: Arc<AudioContext>,
    bands: Vec<EqBand>,
    analyser: Arc<SpectrumAnalyser>,
}

impl FilterGraph {
    /// Build the five-band graph on `source`
    ///
    /// All bands start flat. Fails without touching the source if it
    /// already feeds another graph.
    pub fn build(
        context: &Arc<AudioContext>,
        source: &MediaSource,
        analyser_config: AnalyserConfig,
    ) -> Result<Self> {
        if source.is_connected() {
            return Err(AudioError::SourceAlreadyConnected);
        }

        let analyser = Arc::new(SpectrumAnalyser::new(analyser_config)?);
        let mut chain = EffectChain::new();
        let mut bands = Vec::with_capacity(BAND_COUNT);

        for (index, frequency) in EQ_FREQUENCIES.iter().enumerate() {
            let spec = BandSpec::new(*frequency, FilterShape::for_position(index, BAND_COUNT));
            let gain = Arc::new(AudioParam::new(0.0));
            chain.add_effect(Box::new(BandFilter::new(
                spec,
                Arc::clone(&gain),
                Arc::clone(context),
            )?));
            bands.push(EqBand { spec, gain });
        }
        chain.add_effect(Box::new(AnalyserTap::new(Arc::clone(&analyser))));

        source.connect(GraphProcessor { chain })?;

        debug!(
            sample_rate = context.sample_rate(),
            fft_size = analyser_config.fft_size,
            "Filter graph connected"
        );

        Ok(Self {
            context: Arc::clone(context),
            bands,
            analyser,
        })
    }

    /// Band handles, lowest frequency first
    pub fn bands(&self) -> &[EqBand] {
        &self.bands
    }

    /// The analyser at the end of the chain
    pub fn analyser(&self) -> &Arc<SpectrumAnalyser> {
        &self.analyser
    }

    /// The context whose clock drives automation
    pub fn context(&self) -> &Arc<AudioContext> {
        &self.context
    }
}

/// Owns the graph for one audio context
///
/// `initialize` is idempotent: the first successful call builds the graph,
/// later calls return it. A failed build is logged and leaves any previous
/// graph in place.
#[derive(Debug)]
pub struct AudioEngine {
    context: Arc<AudioContext>,
    source: Arc<MediaSource>,
    analyser_config: AnalyserConfig,
    graph: Option<Arc<FilterGraph>>,
}

impl AudioEngine {
    /// Engine for `source` rendered by `context`
    pub fn new(context: Arc<AudioContext>, source: Arc<MediaSource>) -> Self {
        Self::with_analyser(context, source, AnalyserConfig::default())
    }

    /// Engine with custom analyser settings
    pub fn with_analyser(
        context: Arc<AudioContext>,
        source: Arc<MediaSource>,
        analyser_config: AnalyserConfig,
    ) -> Self {
        Self {
            context,
            source,
            analyser_config,
            graph: None,
        }
    }

    /// Build the graph if it does not exist yet
    pub fn initialize(&mut self) -> Option<Arc<FilterGraph>> {
        if self.graph.is_some() {
            return self.graph.clone();
        }

        match FilterGraph::build(&self.context, &self.source, self.analyser_config) {
            Ok(graph) => {
                info!(bands = BAND_COUNT, "Equalizer initialized");
                self.graph = Some(Arc::new(graph));
            }
            Err(e) => {
                warn!(error = %e, "Equalizer initialization failed");
            }
        }
        self.graph.clone()
    }

    /// The graph, once initialized
    pub fn graph(&self) -> Option<Arc<FilterGraph>> {
        self.graph.clone()
    }

    /// The shared context
    pub fn context(&self) -> &Arc<AudioContext> {
        &self.context
    }

    /// The media source feeding the graph
    pub fn source(&self) -> &Arc<MediaSource> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> (Arc<AudioContext>, Arc<MediaSource>) {
        (Arc::new(AudioContext::new(44100)), Arc::new(MediaSource::new()))
    }

    #[test]
    fn builds_five_flat_bands_in_order() {
        let (ctx, source) = parts();
        let graph = FilterGraph::build(&ctx, &source, AnalyserConfig::default()).unwrap();

        let freqs: Vec<f32> = graph.bands().iter().map(EqBand::frequency).collect();
        assert_eq!(freqs, EQ_FREQUENCIES.to_vec());
        assert_eq!(graph.bands()[0].shape(), FilterShape::LowShelf);
        assert_eq!(graph.bands()[1].shape(), FilterShape::Peaking);
        assert_eq!(graph.bands()[3].shape(), FilterShape::Peaking);
        assert_eq!(graph.bands()[4].shape(), FilterShape::HighShelf);
        assert!(graph.bands().iter().all(|b| b.gain().value() == 0.0));
        assert!(source.is_connected());
    }

    #[test]
    fn second_build_on_same_source_fails() {
        let (ctx, source) = parts();
        let _first = FilterGraph::build(&ctx, &source, AnalyserConfig::default()).unwrap();
        let second = FilterGraph::build(&ctx, &source, AnalyserConfig::default());
        assert!(matches!(second, Err(AudioError::SourceAlreadyConnected)));
    }

    #[test]
    fn initialize_is_idempotent() {
        let (ctx, source) = parts();
        let mut engine = AudioEngine::new(ctx, source);

        let first = engine.initialize().unwrap();
        let second = engine.initialize().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_initialize_is_swallowed() {
        let (ctx, source) = parts();
        let mut owner = AudioEngine::new(Arc::clone(&ctx), Arc::clone(&source));
        owner.initialize().unwrap();

        let mut other = AudioEngine::new(ctx, source);
        assert!(other.initialize().is_none());
        assert!(owner.graph().is_some());
    }

    #[test]
    fn bad_analyser_config_surfaces_as_init_failure() {
        let (ctx, source) = parts();
        let config = AnalyserConfig {
            fft_size: 100,
            ..AnalyserConfig::default()
        };
        let mut engine = AudioEngine::with_analyser(ctx, Arc::clone(&source), config);
        assert!(engine.initialize().is_none());
        assert!(!source.is_connected());
    }

    #[test]
    fn flat_graph_feeds_analyser() {
        let (ctx, source) = parts();
        let graph = FilterGraph::build(&ctx, &source, AnalyserConfig::default()).unwrap();

        let mut buffer: Vec<f32> = (0..2048)
            .map(|i| ((i / 2) as f32 * 0.25).sin() * 0.5)
            .collect();
        source.process(&mut buffer, 44100);

        assert!(buffer.iter().all(|s| s.is_finite()));
        assert!(graph.analyser().byte_frequency_data().iter().any(|b| *b > 0));
    }
}
