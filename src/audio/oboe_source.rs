// Android capture via oboe
//
// Opens a blocking (sync) mono i16 input stream. Each `read` waits at most
// READ_TIMEOUT for samples so the session loop can observe a stop request.
// System loopback needs a MediaProjection session owned by the host app,
// which this backend cannot create; it reports UnsupportedInput instead.

use oboe::{
    AudioInputStreamSync, AudioStream, AudioStreamBuilder, AudioStreamSync, Input, InputPreset,
    PerformanceMode, SharingMode,
};

use super::source::{CaptureBackend, CaptureSource, ReadError};
use crate::config::{InputSource, SessionConfig};
use crate::error::AudioError;

const READ_TIMEOUT_NANOS: i64 = 100_000_000;

#[derive(Debug, Default)]
pub struct OboeBackend;

impl OboeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for OboeBackend {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        if config.input_source != InputSource::Mic {
            return Err(AudioError::UnsupportedInput {
                input: config.input_source.name().to_string(),
            });
        }

        let mut stream = AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Shared)
            .set_direction::<Input>()
            .set_input_preset(InputPreset::Unprocessed)
            .set_sample_rate(config.sample_rate_hz as i32)
            .set_channel_count::<oboe::Mono>()
            .set_format::<i16>()
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Input stream: {:?}", e),
            })?;

        stream.start().map_err(|e| AudioError::HardwareError {
            details: format!("Failed to start input stream: {:?}", e),
        })?;

        let min_read_samples = stream.get_frames_per_burst().max(0) as usize;
        let sample_rate_hz = stream.get_sample_rate().max(0) as u32;

        tracing::info!(
            sample_rate = sample_rate_hz,
            burst = min_read_samples,
            "oboe capture started"
        );

        Ok(Box::new(OboeSource {
            stream,
            min_read_samples,
            sample_rate_hz,
        }))
    }

    fn name(&self) -> &'static str {
        "oboe"
    }
}

struct OboeSource {
    stream: AudioStreamSync<Input, (i16, oboe::Mono)>,
    min_read_samples: usize,
    sample_rate_hz: u32,
}

impl CaptureSource for OboeSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError> {
        match self.stream.read(buf, READ_TIMEOUT_NANOS) {
            Ok(count) => Ok(count.max(0) as usize),
            Err(err) => Err(map_read_error(err)),
        }
    }

    fn min_read_samples(&self) -> usize {
        self.min_read_samples
    }

    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}

impl Drop for OboeSource {
    fn drop(&mut self) {
        if let Err(err) = self.stream.stop() {
            tracing::warn!("failed to stop oboe input stream: {:?}", err);
        }
    }
}

fn map_read_error(err: oboe::Error) -> ReadError {
    match err {
        oboe::Error::Disconnected | oboe::Error::Closed => ReadError::DeviceGone,
        oboe::Error::InvalidState | oboe::Error::InvalidHandle => ReadError::InvalidOperation,
        oboe::Error::IllegalArgument | oboe::Error::OutOfRange => ReadError::BadValue,
        other => ReadError::Transient { code: other as i32 },
    }
}
