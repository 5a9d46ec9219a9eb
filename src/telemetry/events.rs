//! Session lifecycle events published to status observers.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisMode;
use crate::config::InputSource;

/// Why a session's worker loop ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `stop` was called
    Requested,
    /// The capture device reported a fatal read error
    DeviceError,
    /// The capture source ran out of samples (file or finite generator)
    EndOfStream,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        mode: AnalysisMode,
        input_source: InputSource,
        read_buffer_samples: usize,
    },
    Stopped {
        reason: StopReason,
        frames_processed: u64,
    },
}
