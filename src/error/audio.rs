// Audio error types and constants

use thiserror::Error;
use tracing::error;

use crate::error::{ConfigError, ErrorCode};

/// Audio error code constants
///
/// These constants provide a single source of truth for error codes
/// shared with host applications embedding the analyzer.
///
/// Error code range: 1001-1008
pub struct AudioErrorCodes;

impl AudioErrorCodes {
    /// Analysis session is already running
    pub const ALREADY_RUNNING: i32 = 1001;

    /// Analysis session is not running
    pub const NOT_RUNNING: i32 = 1002;

    /// Failed to open the capture device
    pub const STREAM_OPEN_FAILED: i32 = 1003;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;

    /// Capture stream failed or the worker could not be started
    pub const STREAM_FAILURE: i32 = 1006;

    /// Requested input source is not available on this platform
    pub const UNSUPPORTED_INPUT: i32 = 1007;

    /// Session configuration rejected at construction
    pub const INVALID_CONFIG: i32 = 1008;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AnalysisSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio and session related errors
///
/// These errors cover capture initialization, session lifecycle
/// and hardware access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("Analysis session already running. Call stop() first.")]
    AlreadyRunning,

    #[error("Analysis session not running. Call start() first.")]
    NotRunning,

    #[error("Failed to open capture stream: {reason}")]
    StreamOpenFailed { reason: String },

    #[error("Hardware error: {details}")]
    HardwareError { details: String },

    #[error("Lock poisoned on {component}")]
    LockPoisoned { component: String },

    #[error("Capture stream failed: {reason}")]
    StreamFailure { reason: String },

    #[error("Input source '{input}' is not supported by this backend")]
    UnsupportedInput { input: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AlreadyRunning => AudioErrorCodes::ALREADY_RUNNING,
            AudioError::NotRunning => AudioErrorCodes::NOT_RUNNING,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::UnsupportedInput { .. } => AudioErrorCodes::UNSUPPORTED_INPUT,
            AudioError::Config(_) => AudioErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}
