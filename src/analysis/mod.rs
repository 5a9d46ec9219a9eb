// Analysis module - per-frame DSP pipeline for haptic triggering
//
// Each capture read flows through the same fixed sequence:
//
//   raw i16 -> FrameBufferAdapter -> SpectralTransform -> BandEnergyExtractor
//          \-> frame_energy ----------------------------> BeatDetector
//                                                          |
//                                       EventDispatcher <--+--> HapticSink
//
// Frames are independent apart from the detector's debounce state. Nothing in
// here blocks or returns an error once the pipeline has been constructed.

pub mod bands;
pub mod dispatch;
pub mod frame;
pub mod mode;
pub mod onset;
pub mod spectrum;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ConfigError;

pub use bands::{BandEnergyExtractor, BandIntensity, BandLayout, BandRange};
pub use dispatch::{
    CallbackSink, EventDispatcher, HapticEvent, HapticEventKind, HapticSink, NullSink,
};
pub use frame::{AnalysisFrame, FrameBufferAdapter};
pub use mode::{AnalysisMode, Band};
pub use onset::{frame_energy, BeatDetector, BeatState};
pub use spectrum::{SpectralTransform, SpectrumBuffer};

/// Result of processing one capture read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub bands: BandIntensity,
    /// Beat intensity if the detector fired on this frame
    pub beat: Option<f32>,
    /// Mean-square energy of the raw read
    pub energy: f32,
    /// Largest absolute raw sample in the read
    pub peak: u16,
    pub events_emitted: usize,
}

/// Owns all per-session analysis state.
///
/// Built once per session from a validated [`AppConfig`]; the mode, transform
/// size and band layout cannot change afterwards.
pub struct AnalysisPipeline {
    adapter: FrameBufferAdapter,
    transform: SpectralTransform,
    extractor: BandEnergyExtractor,
    detector: BeatDetector,
    dispatcher: EventDispatcher,
    sample_rate_hz: f32,
    log_every_n_frames: u64,
    frames: u64,
}

impl AnalysisPipeline {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let analysis = &config.analysis;
        let mode = config.session.mode;

        Ok(Self {
            adapter: FrameBufferAdapter::new(analysis.fft_size),
            transform: SpectralTransform::new(analysis.fft_size, analysis.window)?,
            extractor: BandEnergyExtractor::new(
                analysis.bands,
                analysis.fft_size,
                analysis.max_intensity_level,
            ),
            detector: BeatDetector::new(&config.onset, mode),
            dispatcher: EventDispatcher::new(mode),
            sample_rate_hz: config.session.sample_rate_hz as f32,
            log_every_n_frames: config.log_every_n_frames,
            frames: 0,
        })
    }

    pub fn mode(&self) -> AnalysisMode {
        self.dispatcher.mode()
    }

    pub fn fft_size(&self) -> usize {
        self.transform.fft_size()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn beat_state(&self) -> &BeatState {
        self.detector.state()
    }

    /// Run one read through the pipeline and deliver its events to `sink`.
    ///
    /// `raw` may be shorter or longer than the transform size. The spectrum
    /// sees the first N samples (zero-padded); beat energy covers the whole read.
    pub fn process(&mut self, raw: &[i16], now_ms: u64, sink: &mut dyn HapticSink) -> FrameAnalysis {
        let frame = self.adapter.ingest(raw);
        let spectrum = self.transform.transform(frame);
        let bands = self.extractor.extract(spectrum, self.sample_rate_hz);

        let energy = frame_energy(raw);
        let beat = self.detector.evaluate(energy, bands.bass, now_ms);
        let events_emitted = self.dispatcher.dispatch(beat, &bands, now_ms, sink);

        let peak = raw.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        self.frames += 1;

        tracing::trace!(
            frame = self.frames,
            count = raw.len(),
            peak,
            energy,
            bass = bands.bass,
            mid = bands.mid,
            treble = bands.treble,
            "frame analyzed"
        );
        if self.log_every_n_frames > 0 && self.frames % self.log_every_n_frames == 0 {
            tracing::debug!(
                frame = self.frames,
                peak,
                energy,
                bass = bands.bass,
                mid = bands.mid,
                treble = bands.treble,
                "periodic frame stats"
            );
        }

        FrameAnalysis {
            bands,
            beat,
            energy,
            peak,
            events_emitted,
        }
    }
}
