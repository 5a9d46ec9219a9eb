// Error types for the haptic beat analyzer
//
// This module defines custom error types for capture/session and configuration
// operations, providing structured error handling with stable numeric codes
// that host applications can branch on.

mod audio;
mod config;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use config::{ConfigError, ConfigErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the embedding boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
