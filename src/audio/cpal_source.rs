// Desktop capture via cpal
//
// The cpal data callback runs on the host's audio thread. It downmixes to the
// first channel, converts to i16 and pushes into a lock-free rtrb ring. The
// worker thread drains the ring in `read`, waiting at most `read_timeout` for
// a full buffer.
//
// Input selection:
// - Mic: default input device
// - SystemLoopback: default output device opened for capture (WASAPI
//   loopback). Hosts without loopback support fail at open time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use super::source::{CaptureBackend, CaptureSource, ReadError};
use crate::config::{InputSource, SessionConfig};
use crate::error::AudioError;

/// One second of mono audio at the highest common rate
const RING_CAPACITY: usize = 96_000;
const POLL_INTERVAL: Duration = Duration::from_millis(2);

pub struct CpalBackend {
    read_timeout: Duration,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn device(input: InputSource) -> Result<(cpal::Device, cpal::SupportedStreamConfig), AudioError> {
        let host = cpal::default_host();

        match input {
            InputSource::Mic => {
                let device = host
                    .default_input_device()
                    .ok_or_else(|| AudioError::StreamOpenFailed {
                        reason: "No default input device found".to_string(),
                    })?;
                let config = device
                    .default_input_config()
                    .map_err(|e| AudioError::StreamOpenFailed {
                        reason: format!("Failed to get default input config: {:?}", e),
                    })?;
                Ok((device, config))
            }
            InputSource::SystemLoopback => {
                let device = host
                    .default_output_device()
                    .ok_or_else(|| AudioError::UnsupportedInput {
                        input: input.name().to_string(),
                    })?;
                let config = device
                    .default_output_config()
                    .map_err(|e| AudioError::StreamOpenFailed {
                        reason: format!("Failed to get default output config: {:?}", e),
                    })?;
                Ok((device, config))
            }
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for CpalBackend {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        let (device, supported) = Self::device(config.input_source)?;

        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(config.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };
        let min_read_samples = match supported.buffer_size() {
            cpal::SupportedBufferSize::Range { min, .. } => *min as usize,
            cpal::SupportedBufferSize::Unknown => 0,
        };

        let (producer, consumer) = rtrb::RingBuffer::<i16>::new(RING_CAPACITY);
        let shared = Arc::new(SharedState::default());

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, producer, Arc::clone(&shared))
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, producer, Arc::clone(&shared))
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, producer, Arc::clone(&shared))
            }
            other => {
                return Err(AudioError::StreamOpenFailed {
                    reason: format!("Unsupported capture sample format {:?}", other),
                })
            }
        }?;

        stream.play().map_err(|e| AudioError::HardwareError {
            details: format!("Failed to start capture stream: {:?}", e),
        })?;

        tracing::info!(
            input = config.input_source.name(),
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate_hz,
            channels = stream_config.channels,
            "cpal capture started"
        );

        Ok(Box::new(CpalSource {
            _stream: stream,
            consumer,
            shared,
            read_timeout: self.read_timeout,
            min_read_samples,
            sample_rate_hz: config.sample_rate_hz,
        }))
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

#[derive(Debug, Default)]
struct SharedState {
    failed: AtomicBool,
    overruns: AtomicU64,
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: rtrb::Producer<i16>,
    shared: Arc<SharedState>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    let err_shared = Arc::clone(&shared);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // First channel only
                for frame in data.chunks(channels) {
                    let sample = i16::from_sample(frame[0]);
                    if producer.push(sample).is_err() {
                        shared.overruns.fetch_add(1, Ordering::Relaxed);
                    }
                }
            },
            move |err| {
                tracing::error!("capture stream error: {}", err);
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    err_shared.failed.store(true, Ordering::Release);
                }
            },
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })
}

struct CpalSource {
    // Dropping the stream stops capture
    _stream: cpal::Stream,
    consumer: rtrb::Consumer<i16>,
    shared: Arc<SharedState>,
    read_timeout: Duration,
    min_read_samples: usize,
    sample_rate_hz: u32,
}

impl CaptureSource for CpalSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError> {
        let deadline = Instant::now() + self.read_timeout;

        while self.consumer.slots() < buf.len() {
            if self.shared.failed.load(Ordering::Acquire) {
                return Err(ReadError::DeviceGone);
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        let count = self.consumer.slots().min(buf.len());
        if count == 0 {
            return Ok(0);
        }

        let chunk = self
            .consumer
            .read_chunk(count)
            .map_err(|_| ReadError::Transient { code: -1 })?;
        let (first, second) = chunk.as_slices();
        buf[..first.len()].copy_from_slice(first);
        buf[first.len()..first.len() + second.len()].copy_from_slice(second);
        chunk.commit_all();

        let overruns = self.shared.overruns.swap(0, Ordering::Relaxed);
        if overruns > 0 {
            tracing::warn!(dropped = overruns, "capture ring overrun");
        }

        Ok(count)
    }

    fn min_read_samples(&self) -> usize {
        self.min_read_samples
    }

    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}
