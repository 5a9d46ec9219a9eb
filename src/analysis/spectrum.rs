// Spectral transform - forward FFT of one analysis frame
//
// The transform is planned once per session for a fixed power-of-two size N.
// Output is written into a SpectrumBuffer of 2N floats holding interleaved
// (real, imaginary) coefficients for bins 0..N. Only the first N/2 bins are
// meaningful for a real input; the extractor never reads past them.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::frame::AnalysisFrame;
use crate::config::WindowFunction;
use crate::error::ConfigError;

/// Interleaved (re, im) transform coefficients, overwritten every frame
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumBuffer {
    data: Vec<f32>,
}

impl SpectrumBuffer {
    pub fn new(fft_size: usize) -> Self {
        Self {
            data: vec![0.0; fft_size * 2],
        }
    }

    /// Build a buffer from raw interleaved values (length must be even).
    pub fn from_interleaved(data: Vec<f32>) -> Self {
        debug_assert!(data.len() % 2 == 0, "interleaved data must be even length");
        Self { data }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Transform size N this buffer was sized for
    pub fn fft_size(&self) -> usize {
        self.data.len() / 2
    }

    /// Real and imaginary part of bin `index`
    #[inline]
    pub fn bin(&self, index: usize) -> (f32, f32) {
        (self.data[2 * index], self.data[2 * index + 1])
    }

    /// Magnitude-squared of bin `index`
    #[inline]
    pub fn power(&self, index: usize) -> f32 {
        let (re, im) = self.bin(index);
        re * re + im * im
    }
}

/// Forward FFT of fixed size, planned at construction
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Pre-computed window coefficients (all ones for rectangular)
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    spectrum: SpectrumBuffer,
}

impl SpectralTransform {
    /// Plan a transform of `fft_size` points.
    ///
    /// Sizes that are not a power of two are rejected here so that
    /// `transform` itself is total.
    pub fn new(fft_size: usize, window: WindowFunction) -> Result<Self, ConfigError> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo { size: fft_size });
        }

        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            fft_size,
            window: window_coefficients(window, fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            spectrum: SpectrumBuffer::new(fft_size),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Transform `frame` and return the interleaved spectrum.
    ///
    /// The frame must be exactly `fft_size` samples long; the frame adapter
    /// guarantees this, so a mismatch is a contract violation.
    pub fn transform(&mut self, frame: &AnalysisFrame) -> &SpectrumBuffer {
        assert_eq!(
            frame.len(),
            self.fft_size,
            "frame length must match transform size"
        );

        for ((slot, &sample), &w) in self
            .buffer
            .iter_mut()
            .zip(frame.samples())
            .zip(&self.window)
        {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (pair, c) in self.spectrum.data.chunks_exact_mut(2).zip(&self.buffer) {
            pair[0] = c.re;
            pair[1] = c.im;
        }

        &self.spectrum
    }
}

fn window_coefficients(window: WindowFunction, size: usize) -> Vec<f32> {
    match window {
        WindowFunction::Rectangular => vec![1.0; size],
        // Hann window to reduce spectral leakage
        WindowFunction::Hann => (0..size)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / (size as f32 - 1.0)).cos())
            })
            .collect(),
    }
}
