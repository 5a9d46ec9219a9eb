// Band energy extractor - spectrum to bass/mid/treble intensities
//
// Algorithm:
// 1. power[i] = re[i]^2 + im[i]^2 for the N/2 positive-frequency bins
// 2. band edges map to bins via round(freq / sample_rate * N), clamped to [0, N/2 - 1]
// 3. mean power over each band's inclusive bin range
// 4. intensity = clamp(mean / max_intensity_level, 0, 1)
// 5. intensity = sqrt(intensity) to expand low-energy detail
//
// No state is carried between frames.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::mode::Band;
use super::spectrum::SpectrumBuffer;
use crate::error::ConfigError;

/// Immutable frequency range of one band, in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl BandRange {
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }
}

/// Bass/mid/treble boundaries used by a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandLayout {
    pub bass: BandRange,
    pub mid: BandRange,
    pub treble: BandRange,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self {
            bass: BandRange::new(20.0, 250.0),
            mid: BandRange::new(251.0, 4000.0),
            treble: BandRange::new(4001.0, 20_000.0),
        }
    }
}

impl BandLayout {
    pub fn range(&self, band: Band) -> BandRange {
        match band {
            Band::Bass => self.bass,
            Band::Mid => self.mid,
            Band::Treble => self.treble,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for band in [Band::Bass, Band::Mid, Band::Treble] {
            let range = self.range(band);
            let valid = range.low_hz.is_finite()
                && range.high_hz.is_finite()
                && range.low_hz >= 0.0
                && range.low_hz < range.high_hz;
            if !valid {
                return Err(ConfigError::InvalidBandRange {
                    band: band.name(),
                    low_hz: range.low_hz,
                    high_hz: range.high_hz,
                });
            }
        }
        Ok(())
    }
}

/// Per-frame band intensities, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandIntensity {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl BandIntensity {
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Bass => self.bass,
            Band::Mid => self.mid,
            Band::Treble => self.treble,
        }
    }
}

/// Computes [`BandIntensity`] from a spectrum.
#[derive(Debug, Clone)]
pub struct BandEnergyExtractor {
    layout: BandLayout,
    fft_size: usize,
    max_intensity_level: f32,
}

impl BandEnergyExtractor {
    pub fn new(layout: BandLayout, fft_size: usize, max_intensity_level: f32) -> Self {
        Self {
            layout,
            fft_size,
            max_intensity_level,
        }
    }

    /// Map a frequency to its bin index, clamped to the usable half spectrum.
    pub fn bin_index(&self, freq_hz: f32, sample_rate_hz: f32) -> usize {
        let max_bin = (self.fft_size / 2).saturating_sub(1);
        let index = (freq_hz / sample_rate_hz * self.fft_size as f32).round();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(max_bin)
        }
    }

    /// Inclusive bin range covered by `band` at the given sample rate.
    ///
    /// May be empty (start > end) for degenerate layouts.
    pub fn bin_range(&self, band: Band, sample_rate_hz: f32) -> RangeInclusive<usize> {
        let range = self.layout.range(band);
        self.bin_index(range.low_hz, sample_rate_hz)..=self.bin_index(range.high_hz, sample_rate_hz)
    }

    pub fn extract(&self, spectrum: &SpectrumBuffer, sample_rate_hz: f32) -> BandIntensity {
        debug_assert_eq!(spectrum.fft_size(), self.fft_size);

        BandIntensity {
            bass: self.band_intensity(spectrum, self.bin_range(Band::Bass, sample_rate_hz)),
            mid: self.band_intensity(spectrum, self.bin_range(Band::Mid, sample_rate_hz)),
            treble: self.band_intensity(spectrum, self.bin_range(Band::Treble, sample_rate_hz)),
        }
    }

    fn band_intensity(&self, spectrum: &SpectrumBuffer, bins: RangeInclusive<usize>) -> f32 {
        if bins.is_empty() {
            return 0.0;
        }

        let count = (bins.end() - bins.start() + 1).max(1);
        let sum: f32 = bins.map(|i| spectrum.power(i)).sum();
        let mean_power = sum / count as f32;

        // NaN from a pathological spectrum collapses to 0 rather than escaping the clamp
        let normalized = (mean_power / self.max_intensity_level).clamp(0.0, 1.0);
        if normalized.is_nan() {
            0.0
        } else {
            normalized.sqrt()
        }
    }
}
