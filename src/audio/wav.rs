//! WAV file input via hound.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::source::{CaptureBackend, CaptureSource, ReadError};
use crate::config::SessionConfig;
use crate::error::AudioError;

/// Decoded mono clip
#[derive(Debug, Clone, PartialEq)]
pub struct WavClip {
    pub samples: Vec<i16>,
    pub sample_rate_hz: u32,
}

impl WavClip {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate_hz as u64
    }
}

/// Decode a WAV file to mono int16, keeping the first channel.
pub fn read_wav_mono<P: AsRef<Path>>(path: P) -> Result<WavClip, AudioError> {
    let mut reader = hound::WavReader::open(path.as_ref()).map_err(|e| {
        AudioError::StreamOpenFailed {
            reason: format!("{}: {}", path.as_ref().display(), e),
        }
    })?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<Vec<i16>, hound::Error>>(),
        hound::SampleFormat::Int => {
            let shift = spec.bits_per_sample as i32 - 16;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        let scaled = if shift >= 0 { v >> shift } else { v << -shift };
                        scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
                    })
                })
                .collect::<Result<Vec<i16>, hound::Error>>()
        }
    }
    .map_err(|e| AudioError::StreamFailure {
        reason: format!("WAV decode failed: {}", e),
    })?;

    let samples = interleaved.chunks(channels).map(|frame| frame[0]).collect();

    Ok(WavClip {
        samples,
        sample_rate_hz: spec.sample_rate,
    })
}

/// Serves a WAV file as a capture source.
#[derive(Debug, Clone)]
pub struct WavBackend {
    path: PathBuf,
    realtime: bool,
}

impl WavBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            realtime: false,
        }
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

impl CaptureBackend for WavBackend {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        let clip = read_wav_mono(&self.path)?;
        if clip.sample_rate_hz != config.sample_rate_hz {
            tracing::warn!(
                file_rate = clip.sample_rate_hz,
                session_rate = config.sample_rate_hz,
                "WAV sample rate differs from session rate; band edges will be off"
            );
        }

        Ok(Box::new(WavSource {
            clip,
            position: 0,
            realtime: self.realtime,
        }))
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}

struct WavSource {
    clip: WavClip,
    position: usize,
    realtime: bool,
}

impl CaptureSource for WavSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError> {
        let remaining = &self.clip.samples[self.position..];
        if remaining.is_empty() {
            return Err(ReadError::EndOfStream);
        }

        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;

        if self.realtime && self.clip.sample_rate_hz > 0 {
            let micros = count as u64 * 1_000_000 / self.clip.sample_rate_hz as u64;
            thread::sleep(Duration::from_micros(micros));
        }

        Ok(count)
    }

    fn sample_rate_hz(&self) -> u32 {
        self.clip.sample_rate_hz
    }
}
