//! Capture source abstraction shared by every backend.

use crate::config::SessionConfig;
use crate::error::AudioError;

/// Failure of a single capture read
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("capture device disconnected")]
    DeviceGone,
    #[error("capture stream in an invalid state")]
    InvalidOperation,
    #[error("capture read rejected its arguments")]
    BadValue,
    #[error("source has no more samples")]
    EndOfStream,
    #[error("transient capture error (code {code})")]
    Transient { code: i32 },
}

impl ReadError {
    /// Whether the worker loop must stop after this error.
    ///
    /// `EndOfStream` also ends the loop but is reported separately.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ReadError::DeviceGone | ReadError::InvalidOperation | ReadError::BadValue
        )
    }
}

/// An opened, running capture stream producing mono int16 samples.
///
/// `read` may block, but implementations must return (possibly with 0
/// samples) within a bounded time so the session can observe a stop request.
pub trait CaptureSource {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, ReadError>;

    /// Smallest read size the device works well with, in samples
    fn min_read_samples(&self) -> usize {
        0
    }

    /// Sample rate the source actually delivers
    fn sample_rate_hz(&self) -> u32;
}

/// Opens capture sources.
///
/// `open` runs on the session's worker thread, so sources do not have to be
/// `Send`; only the backend itself crosses threads.
pub trait CaptureBackend: Send {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError>;

    fn name(&self) -> &'static str;
}

impl<B: CaptureBackend + ?Sized> CaptureBackend for Box<B> {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn CaptureSource>, AudioError> {
        (**self).open(config)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
