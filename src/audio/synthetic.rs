//! Synthetic capture sources for offline runs, demos and tests.
//!
//! [`SyntheticBackend`] renders a signal pattern sample by sample, optionally
//! paced to wall-clock time. [`ScriptedBackend`] replays an exact sequence of
//! read results, which lets tests drive the session loop through empty reads,
//! transient errors and device loss deterministically.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::source::{CaptureBackend, CaptureSource, ReadError};
use crate::config::SessionConfig;
use crate::error::AudioError;

/// Signal rendered by [`SyntheticBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum SignalPattern {
    Silence,
    Sine {
        frequency_hz: f32,
    },
    /// Sine bursts of `burst_ms` starting every `interval_ms`
    Bursts {
        frequency_hz: f32,
        interval_ms: u32,
        burst_ms: u32,
    },
    /// Uniform white noise, reproducible from `seed`
    Noise {
        seed: u64,
    },
}

/// Render `len` samples of a sine at `amplitude` (0..=1 of full scale).
pub fn sine_samples(frequency_hz: f32, sample_rate_hz: u32, amplitude: f32, len: usize) -> Vec<i16> {
    (0..len as u64)
        .map(|n| sine_at(n, frequency_hz, sample_rate_hz, amplitude))
        .collect()
}

fn sine_at(n: u64, frequency_hz: f32, sample_rate_hz: u32, amplitude: f32) -> i16 {
    // Reduce the phase in f64 so long runs keep their accuracy
    let cycles = (n as f64 * frequency_hz as f64 / sample_rate_hz as f64).fract();
    let phase = 2.0 * PI * cycles as f32;
    (phase.sin() * amplitude.clamp(0.0, 1.0) * i16::MAX as f32) as i16
}

#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    pattern: SignalPattern,
    amplitude: f32,
    realtime: bool,
    duration_samples: Option<u64>,
}

impl SyntheticBackend {
    pub fn new(pattern: SignalPattern) -> Self {
        Self {
            pattern,
            amplitude: 1.0,
            realtime: false,
            duration_samples: None,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    /// Sleep for the duration of every read, like a live device would.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Stop with end-of-stream after this many samples.
    pub fn with_duration_samples(mut self, samples: u64) -> Self {
        self.duration_samples = Some(samples);
        self
    }
}

impl CaptureBackend for SyntheticBackend {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        let rng = match self.pattern {
            SignalPattern::Noise { seed } => StdRng::seed_from_u64(seed),
            _ => StdRng::seed_from_u64(0),
        };

        Ok(Box::new(SyntheticSource {
            pattern: self.pattern,
            amplitude: self.amplitude,
            realtime: self.realtime,
            remaining: self.duration_samples,
            sample_rate_hz: config.sample_rate_hz,
            position: 0,
            rng,
        }))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

struct SyntheticSource {
    pattern: SignalPattern,
    amplitude: f32,
    realtime: bool,
    remaining: Option<u64>,
    sample_rate_hz: u32,
    position: u64,
    rng: StdRng,
}

impl SyntheticSource {
    fn next_sample(&mut self) -> i16 {
        let n = self.position;
        self.position += 1;

        match self.pattern {
            SignalPattern::Silence => 0,
            SignalPattern::Sine { frequency_hz } => {
                sine_at(n, frequency_hz, self.sample_rate_hz, self.amplitude)
            }
            SignalPattern::Bursts {
                frequency_hz,
                interval_ms,
                burst_ms,
            } => {
                let interval = (interval_ms as u64 * self.sample_rate_hz as u64 / 1000).max(1);
                let burst = burst_ms as u64 * self.sample_rate_hz as u64 / 1000;
                if n % interval < burst {
                    sine_at(n, frequency_hz, self.sample_rate_hz, self.amplitude)
                } else {
                    0
                }
            }
            SignalPattern::Noise { .. } => {
                let value: f32 = self.rng.gen_range(-1.0..=1.0);
                (value * self.amplitude * i16::MAX as f32) as i16
            }
        }
    }
}

impl CaptureSource for SyntheticSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError> {
        let count = match self.remaining {
            Some(0) => return Err(ReadError::EndOfStream),
            Some(remaining) => (remaining.min(buf.len() as u64)) as usize,
            None => buf.len(),
        };

        for slot in &mut buf[..count] {
            *slot = self.next_sample();
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= count as u64;
        }

        if self.realtime && self.sample_rate_hz > 0 {
            let micros = count as u64 * 1_000_000 / self.sample_rate_hz as u64;
            thread::sleep(Duration::from_micros(micros));
        }

        Ok(count)
    }

    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}

/// One scripted read result
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Samples(Vec<i16>),
    /// A read that returns 0 samples
    Empty,
    Error(ReadError),
}

/// What a [`ScriptedBackend`] source does once its script runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Keep returning empty reads until stopped
    Idle,
    /// Report end of stream
    EndOfStream,
}

/// Replays a fixed sequence of read results.
pub struct ScriptedBackend {
    steps: Vec<ScriptStep>,
    end: ScriptEnd,
    read_delay: Duration,
    open_error: Option<AudioError>,
    released: Arc<AtomicBool>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            end: ScriptEnd::Idle,
            read_delay: Duration::from_millis(1),
            open_error: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Backend whose `open` always fails with `err`
    pub fn failing(err: AudioError) -> Self {
        let mut backend = Self::new(Vec::new());
        backend.open_error = Some(err);
        backend
    }

    pub fn ending_with(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Flag set once the opened source has been dropped.
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl CaptureBackend for ScriptedBackend {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        Ok(Box::new(ScriptedSource {
            steps: self.steps.iter().cloned().collect(),
            end: self.end,
            read_delay: self.read_delay,
            released: Arc::clone(&self.released),
            sample_rate_hz: config.sample_rate_hz,
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    end: ScriptEnd,
    read_delay: Duration,
    released: Arc<AtomicBool>,
    sample_rate_hz: u32,
}

impl CaptureSource for ScriptedSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError> {
        if !self.read_delay.is_zero() {
            thread::sleep(self.read_delay);
        }

        match self.steps.pop_front() {
            Some(ScriptStep::Samples(samples)) => {
                let count = samples.len().min(buf.len());
                buf[..count].copy_from_slice(&samples[..count]);
                Ok(count)
            }
            Some(ScriptStep::Empty) => Ok(0),
            Some(ScriptStep::Error(err)) => Err(err),
            None => match self.end {
                ScriptEnd::Idle => Ok(0),
                ScriptEnd::EndOfStream => Err(ReadError::EndOfStream),
            },
        }
    }

    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::Release);
    }
}
