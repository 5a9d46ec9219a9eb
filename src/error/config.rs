// Configuration error types and constants

use thiserror::Error;

use crate::error::ErrorCode;

/// Configuration error code constants
///
/// Error code range: 3001-3006
pub struct ConfigErrorCodes;

impl ConfigErrorCodes {
    /// Transform size is not a power of two
    pub const FFT_SIZE_NOT_POWER_OF_TWO: i32 = 3001;

    /// Band range is empty, inverted or negative
    pub const INVALID_BAND_RANGE: i32 = 3002;

    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 3003;

    /// Capture buffer size is zero
    pub const INVALID_BUFFER_SIZE: i32 = 3004;

    /// Threshold, scale factor or intensity level is not usable
    pub const INVALID_CALIBRATION: i32 = 3005;

    /// Global haptic intensity outside 0-100
    pub const GLOBAL_INTENSITY_OUT_OF_RANGE: i32 = 3006;
}

/// Errors raised while validating a session configuration
///
/// These are always reported at construction time; the per-frame path
/// never produces them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("FFT size must be a power of two >= 2 (got {size})")]
    FftSizeNotPowerOfTwo { size: usize },

    #[error("band '{band}' has an invalid range [{low_hz}, {high_hz}] Hz")]
    InvalidBandRange {
        band: &'static str,
        low_hz: f32,
        high_hz: f32,
    },

    #[error("sample rate must be greater than 0 Hz")]
    InvalidSampleRate,

    #[error("capture buffer size must be greater than 0 samples")]
    InvalidBufferSize,

    #[error("calibration constant '{name}' is invalid ({value})")]
    InvalidCalibration { name: &'static str, value: f32 },

    #[error("global intensity must be within 0-100 percent (got {percent})")]
    GlobalIntensityOutOfRange { percent: u8 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::FftSizeNotPowerOfTwo { .. } => ConfigErrorCodes::FFT_SIZE_NOT_POWER_OF_TWO,
            ConfigError::InvalidBandRange { .. } => ConfigErrorCodes::INVALID_BAND_RANGE,
            ConfigError::InvalidSampleRate => ConfigErrorCodes::INVALID_SAMPLE_RATE,
            ConfigError::InvalidBufferSize => ConfigErrorCodes::INVALID_BUFFER_SIZE,
            ConfigError::InvalidCalibration { .. } => ConfigErrorCodes::INVALID_CALIBRATION,
            ConfigError::GlobalIntensityOutOfRange { .. } => {
                ConfigErrorCodes::GLOBAL_INTENSITY_OUT_OF_RANGE
            }
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
